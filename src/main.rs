use anyhow::Context;
use clap::{Parser, Subcommand};
use gitops_utl::{JobsConfig, JobsPipeline, RenameConfig, Renamer};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "gitops-utl",
    version,
    about = "GitOps repository helpers",
    long_about = "Helpers run while reconciling a GitOps repository.\n\n\
    USAGE EXAMPLES:\n  \
      # Generate the Jenkins job helm values for every Jenkins server\n  \
      gitops-utl jenkins-jobs --default-xml-template jobs/default.xml\n\n  \
      # Rename YAML manifests to canonical file names\n  \
      gitops-utl rename --dir config-root"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generates the Jenkins Jobs helm files
    #[command(name = "jenkins-jobs", visible_alias = "jobs")]
    JenkinsJobs {
        /// The current working directory
        #[arg(short, long, default_value = ".", value_name = "PATH")]
        dir: PathBuf,

        /// The output directory for the generated config files [default: <dir>/jenkins]
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// The source config file [default: <dir>/.jx/gitops/source-config.yaml]
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// The default XML template file if none is configured for a repository
        #[arg(long, value_name = "FILE")]
        default_xml_template: Option<PathBuf>,
    },

    /// Renames yaml files to use canonical file names based on the resource name and kind
    Rename {
        /// The directory to recursively look for the *.yaml or *.yml files
        #[arg(short, long, default_value = ".", value_name = "PATH")]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    match cli.command {
        Command::JenkinsJobs {
            dir,
            out,
            config,
            default_xml_template,
        } => {
            let mut builder = JobsConfig::builder().dir(dir);
            if let Some(out) = out {
                builder = builder.out_dir(out);
            }
            if let Some(config) = config {
                builder = builder.config_file(config);
            }
            if let Some(template) = default_xml_template {
                builder = builder.default_xml_template(template);
            }

            let config = builder.build().context("Failed to validate options")?;

            let stats = JobsPipeline::new(config)
                .context("Failed to create pipeline")?
                .run()
                .context("Failed to generate Jenkins jobs")?;

            stats.print_summary();
        }
        Command::Rename { dir } => {
            let renamer = Renamer::new(RenameConfig::new(&dir))
                .context("Failed to validate options")?;

            let stats = renamer
                .run()
                .with_context(|| format!("Failed to rename YAML files in dir {}", dir.display()))?;

            stats.print_summary();
        }
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("gitops_utl=info"),
        1 => EnvFilter::new("gitops_utl=debug"),
        _ => EnvFilter::new("gitops_utl=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
