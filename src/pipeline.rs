use crate::{
    config::JobsConfig,
    error::{Error, Result},
    jobs::JobCollector,
    source_config,
    writer::ValuesWriter,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Statistics collected during a Jenkins job generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobsStats {
    /// Number of repository groups in the source config
    pub groups: usize,

    /// Number of repositories in the source config
    pub repositories: usize,

    /// Repositories with a `jenkins` block that were skipped
    pub skipped_repositories: usize,

    /// Number of job configs collected
    pub jobs: usize,

    /// Number of Jenkins servers with at least one job
    pub servers: usize,

    /// Values files written
    pub files_written: Vec<PathBuf>,

    /// Output directory path
    pub output_directory: String,

    /// Total execution time
    pub duration: Duration,
}

impl JobsStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!(
            "Generated {} Jenkins job(s) for {} server(s) from {} repositories in {} group(s)",
            self.jobs, self.servers, self.repositories, self.groups
        );
        if self.skipped_repositories > 0 {
            println!("  Skipped repositories: {}", self.skipped_repositories);
        }
        for path in &self.files_written {
            println!("  {}", path.display());
        }
    }
}

/// Generates Helm values files with Jenkins jobs from a source config.
pub struct JobsPipeline {
    config: JobsConfig,
}

impl JobsPipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: JobsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Executes the run and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Load**: reads the source config; a missing file ends the run
    /// 2. **Collect**: defaults each repository and resolves its job template
    /// 3. **Write**: renders the jobs of each server into its `values.yaml`
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails. Values files written before the
    /// failure are left in place.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gitops_utl::{JobsConfig, JobsPipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = JobsConfig::builder()
    ///     .dir(".")
    ///     .default_xml_template("jobs/default.xml")
    ///     .build()?;
    ///
    /// let stats = JobsPipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(dir = %self.config.dir.display()))]
    pub fn run(self) -> Result<JobsStats> {
        let start_time = Instant::now();
        let config = &self.config;

        let mut stats = JobsStats {
            output_directory: config.out_dir.display().to_string(),
            ..JobsStats::default()
        };

        if !config.config_file.is_file() {
            info!(
                "the source config file {} does not exist",
                config.config_file.display()
            );
            stats.duration = start_time.elapsed();
            return Ok(stats);
        }

        if let Some(template) = &config.default_xml_template {
            if !template.is_file() {
                return Err(Error::template_not_found("default-xml-template", template));
            }
        }

        let mut source = source_config::load(&config.config_file)?;

        let collector = JobCollector::new(&config.dir, config.default_xml_template.as_deref());
        let (servers, collected) = collector.collect(&mut source)?;

        stats.groups = collected.groups;
        stats.repositories = collected.repositories;
        stats.skipped_repositories = collected.skipped;
        stats.jobs = servers.job_count();
        stats.servers = servers.len();

        info!(
            "collected {} job(s) for {} Jenkins server(s)",
            stats.jobs, stats.servers
        );

        let mut writer = ValuesWriter::new(&config.out_dir);
        stats.files_written = writer.write_servers(&servers)?;
        stats.duration = start_time.elapsed();

        info!(
            "generated {} values file(s) in {:.2}s",
            stats.files_written.len(),
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use std::fs;

    const DEFAULT_TEMPLATE: &str = "<project><scm>{{ CloneURL }}</scm><name>{{ Repository }}</name></project>";

    fn write_source_config(temp: &TempDir, body: &str) {
        temp.child(".jx/gitops/source-config.yaml")
            .write_str(body)
            .unwrap();
    }

    fn run(temp: &TempDir, default_template: Option<&str>) -> Result<JobsStats> {
        let mut builder = JobsConfig::builder().dir(temp.path());
        if let Some(t) = default_template {
            builder = builder.default_xml_template(temp.path().join(t));
        }
        JobsPipeline::new(builder.build()?)?.run()
    }

    fn values(temp: &TempDir, server: &str) -> serde_yaml::Value {
        let path = temp.path().join("jenkins").join(server).join("values.yaml");
        serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_generates_values_for_server() {
        let temp = TempDir::new().unwrap();
        temp.child("default.xml").write_str(DEFAULT_TEMPLATE).unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    provider: github.com
    repositories:
    - name: app1
      url: https://github.com/acme/app1
      jenkins:
        server: ci1
"#,
        );

        let stats = run(&temp, Some("default.xml")).unwrap();

        assert_eq!(stats.jobs, 1);
        assert_eq!(stats.servers, 1);
        assert_eq!(stats.files_written.len(), 1);

        let doc = values(&temp, "ci1");
        assert_eq!(
            doc["master"]["jobs"]["app1"].as_str().unwrap(),
            "<project><scm>https://github.com/acme/app1.git</scm><name>app1</name></project>"
        );
    }

    #[test]
    fn test_missing_source_config_is_not_an_error() {
        let temp = TempDir::new().unwrap();

        let stats = run(&temp, Some("missing.xml")).unwrap();

        assert_eq!(stats.jobs, 0);
        assert!(stats.files_written.is_empty());
        assert!(!temp.child("jenkins").exists());
    }

    #[test]
    fn test_source_config_directory_counts_as_missing() {
        let temp = TempDir::new().unwrap();
        temp.child(".jx/gitops/source-config.yaml")
            .create_dir_all()
            .unwrap();

        let stats = run(&temp, None).unwrap();

        assert_eq!(stats.jobs, 0);
        assert!(!temp.child("jenkins").exists());
    }

    #[test]
    fn test_repositories_without_jenkins_produce_nothing() {
        let temp = TempDir::new().unwrap();
        temp.child("default.xml").write_str(DEFAULT_TEMPLATE).unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    repositories:
    - name: lib1
    - name: app1
      jenkins:
        server: ""
"#,
        );

        let stats = run(&temp, Some("default.xml")).unwrap();

        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.skipped_repositories, 1);
        assert_eq!(stats.jobs, 0);
        assert!(!temp.child("jenkins").exists());
    }

    #[test]
    fn test_missing_default_template_fails_before_writing() {
        let temp = TempDir::new().unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    repositories:
    - name: app1
      jenkins:
        server: ci1
"#,
        );

        let err = run(&temp, Some("missing.xml")).unwrap_err();

        assert!(err.is_template_not_found());
        assert!(err.to_string().contains("default-xml-template"));
        assert!(!temp.child("jenkins").exists());
    }

    #[test]
    fn test_missing_repository_template_fails_before_writing() {
        let temp = TempDir::new().unwrap();
        temp.child("default.xml").write_str(DEFAULT_TEMPLATE).unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    repositories:
    - name: app1
      jenkins:
        server: ci1
    - name: app2
      jenkins:
        server: ci2
        xmlTemplate: jobs/missing.xml
"#,
        );

        let err = run(&temp, Some("default.xml")).unwrap_err();

        assert!(err.is_template_not_found());
        assert!(!temp.child("jenkins").exists());
    }

    #[test]
    fn test_duplicate_repository_names_yield_one_job() {
        let temp = TempDir::new().unwrap();
        temp.child("default.xml").write_str(DEFAULT_TEMPLATE).unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    repositories:
    - name: app1
      jenkins:
        server: ci1
  - owner: other
    repositories:
    - name: app1
      jenkins:
        server: ci1
"#,
        );

        let stats = run(&temp, Some("default.xml")).unwrap();
        assert_eq!(stats.jobs, 2);

        let doc = values(&temp, "ci1");
        let jobs = &doc["master"]["jobs"];
        assert_eq!(jobs.as_mapping().unwrap().len(), 1);
        assert!(jobs["app1"].is_string());
    }

    #[test]
    fn test_malformed_source_config_fails() {
        let temp = TempDir::new().unwrap();
        write_source_config(&temp, "spec: [\n");

        let err = run(&temp, None).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_template_error_is_fatal() {
        let temp = TempDir::new().unwrap();
        temp.child("broken.xml").write_str("{{ NotAVariable }}").unwrap();
        write_source_config(
            &temp,
            r#"
spec:
  groups:
  - owner: acme
    repositories:
    - name: app1
      jenkins:
        server: ci1
        xmlTemplate: broken.xml
"#,
        );

        let err = run(&temp, None).unwrap_err();
        assert!(err.to_string().contains("broken.xml"));
    }
}
