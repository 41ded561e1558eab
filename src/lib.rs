//! # gitops-utl
//!
//! Small batch transformations used when reconciling a GitOps repository.
//!
//! ## Features
//!
//! - Generate Helm `values.yaml` files holding Jenkins job XML for every
//!   repository listed in `.jx/gitops/source-config.yaml`
//! - Rename Kubernetes YAML manifests to canonical `<name>-<kind>.yaml` names
//!
//! ## Quick Start
//!
//! ```no_run
//! use gitops_utl::{JobsConfig, JobsPipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = JobsConfig::builder()
//!     .dir(".")
//!     .default_xml_template("jobs/default.xml")
//!     .build()?;
//!
//! JobsPipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Job generation is a pipeline:
//! 1. **Source config**: loads groups of repositories and applies group defaults
//! 2. **Collector**: resolves the job template of each repository and groups
//!    jobs by Jenkins server
//! 3. **Writer**: renders every job with Tera and writes
//!    `<out>/<server>/values.yaml`
//!
//! Renaming is a single walk over a directory tree, see [`Renamer`].

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod jobs;
mod pipeline;
mod rename;
mod template;
mod writer;

pub mod source_config;

pub use config::{ConfigBuilder, JobsConfig, RenameConfig};
pub use error::{Error, Result};
pub use jobs::{template_data, JenkinsServers, JenkinsTemplateConfig};
pub use pipeline::{JobsPipeline, JobsStats};
pub use rename::{canonical_name, RenameStats, Renamer};
pub use source_config::SourceConfig;
pub use template::{TemplateData, TemplateEngine};
pub use writer::VALUES_FILE_NAME;

/// Generates the Jenkins job values files described by `config`.
///
/// # Errors
///
/// Returns an error if:
/// - The source config cannot be parsed
/// - A referenced job template is missing or fails to evaluate
/// - An output directory or file cannot be written
///
/// # Examples
///
/// ```no_run
/// use gitops_utl::{generate_jobs, JobsConfig};
///
/// # fn main() -> anyhow::Result<()> {
/// let stats = generate_jobs(JobsConfig::builder().dir(".").build()?)?;
/// println!("{} jobs", stats.jobs);
/// # Ok(())
/// # }
/// ```
pub fn generate_jobs(config: JobsConfig) -> Result<JobsStats> {
    JobsPipeline::new(config)?.run()
}

/// Renames the YAML files below `config.dir` to their canonical names.
///
/// # Errors
///
/// Returns an error if the directory is missing, a YAML file cannot be
/// parsed or a rename fails.
pub fn rename_files(config: RenameConfig) -> Result<RenameStats> {
    Renamer::new(config)?.run()
}
