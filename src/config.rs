use crate::error::{Error, Result};
use crate::source_config::SOURCE_CONFIG_FILE_NAME;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

const DEFAULT_OUT_DIR_NAME: &str = "jenkins";

/// Configuration for a Jenkins job generation run.
///
/// Use [`JobsConfig::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct JobsConfig {
    /// Working directory; per-repository templates are resolved against it
    pub dir: PathBuf,

    /// Directory receiving one sub directory per Jenkins server
    pub out_dir: PathBuf,

    /// Source config file to load
    pub config_file: PathBuf,

    /// Template used for repositories without their own `xmlTemplate`
    pub default_xml_template: Option<PathBuf>,
}

impl JobsConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitops_utl::JobsConfig;
    ///
    /// let config = JobsConfig::builder()
    ///     .dir("/work")
    ///     .build()
    ///     .expect("valid configuration");
    ///
    /// assert!(config.out_dir.ends_with("jenkins"));
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the output path is an existing file.
    pub fn validate(&self) -> Result<()> {
        if self.out_dir.is_file() {
            return Err(Error::config(format!(
                "Output path is a file, expected a directory: {}",
                self.out_dir.display()
            )));
        }

        Ok(())
    }

    /// Returns the default source config location below `dir`.
    #[must_use]
    pub fn default_config_file(dir: &Path) -> PathBuf {
        dir.join(".jx").join("gitops").join(SOURCE_CONFIG_FILE_NAME)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        let dir = PathBuf::from(".");
        Self {
            out_dir: dir.join(DEFAULT_OUT_DIR_NAME),
            config_file: Self::default_config_file(&dir),
            dir,
            default_xml_template: None,
        }
    }
}

/// Builder for creating a [`JobsConfig`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    default_xml_template: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Sets the working directory.
    #[must_use]
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Sets the output directory. Defaults to `<dir>/jenkins`.
    #[must_use]
    pub fn out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(path.into());
        self
    }

    /// Sets the source config file.
    /// Defaults to `<dir>/.jx/gitops/source-config.yaml`.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Sets the fallback job XML template.
    ///
    /// The path is used as given, it is not joined with the working directory.
    #[must_use]
    pub fn default_xml_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_xml_template = Some(path.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<JobsConfig> {
        let dir = self.dir.unwrap_or_else(|| PathBuf::from("."));
        let config = JobsConfig {
            out_dir: self
                .out_dir
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| dir.join(DEFAULT_OUT_DIR_NAME)),
            config_file: self
                .config_file
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| JobsConfig::default_config_file(&dir)),
            default_xml_template: self
                .default_xml_template
                .filter(|p| !p.as_os_str().is_empty()),
            dir,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Joins `path` below `base` lexically.
///
/// Root and prefix components of `path` are dropped and `..` never climbs
/// above `base`, so the result always stays inside `base`.
pub(crate) fn join_under(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let mut parts: Vec<&OsStr> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    let mut joined = base.to_path_buf();
    joined.extend(parts);
    joined
}

/// Configuration for a rename run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct RenameConfig {
    /// Directory searched recursively for `*.yaml` / `*.yml` files
    pub dir: PathBuf,
}

impl RenameConfig {
    /// Creates a rename configuration for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or is not a directory.
    pub fn validate(&self) -> Result<()> {
        if !self.dir.exists() {
            return Err(Error::config(format!(
                "Directory does not exist: {}",
                self.dir.display()
            )));
        }

        if !self.dir.is_dir() {
            return Err(Error::config(format!(
                "Path is not a directory: {}",
                self.dir.display()
            )));
        }

        Ok(())
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_defaults_follow_dir() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = JobsConfig::builder().dir(temp.path()).build().unwrap();

        assert_eq!(config.out_dir, temp.path().join("jenkins"));
        assert_eq!(
            config.config_file,
            temp.path().join(".jx").join("gitops").join("source-config.yaml")
        );
        assert!(config.default_xml_template.is_none());
    }

    #[test]
    fn test_explicit_paths_win() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = JobsConfig::builder()
            .dir(temp.path())
            .out_dir(temp.path().join("out"))
            .config_file(temp.path().join("sc.yaml"))
            .default_xml_template(temp.path().join("job.xml"))
            .build()
            .unwrap();

        assert_eq!(config.out_dir, temp.path().join("out"));
        assert_eq!(config.config_file, temp.path().join("sc.yaml"));
        assert_eq!(config.default_xml_template, Some(temp.path().join("job.xml")));
    }

    #[test]
    fn test_empty_paths_fall_back_to_defaults() {
        let config = JobsConfig::builder()
            .dir("work")
            .out_dir("")
            .default_xml_template("")
            .build()
            .unwrap();

        assert_eq!(config.out_dir, PathBuf::from("work").join("jenkins"));
        assert!(config.default_xml_template.is_none());
    }

    #[test]
    fn test_out_dir_must_not_be_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("out");
        file.write_str("not a dir").unwrap();

        let result = JobsConfig::builder()
            .dir(temp.path())
            .out_dir(file.path())
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_config_file_directory_is_accepted() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("sc").create_dir_all().unwrap();

        let config = JobsConfig::builder()
            .dir(temp.path())
            .config_file(temp.path().join("sc"))
            .build();

        assert!(config.is_ok());
    }

    #[test]
    fn test_join_under_keeps_relative_paths() {
        let base = Path::new("/work");
        assert_eq!(join_under(base, "ci1"), PathBuf::from("/work/ci1"));
        assert_eq!(join_under(base, "jobs/./a.xml"), PathBuf::from("/work/jobs/a.xml"));
        assert_eq!(join_under(base, "jobs/../a.xml"), PathBuf::from("/work/a.xml"));
    }

    #[test]
    fn test_join_under_never_leaves_base() {
        let base = Path::new("/work/out");
        assert_eq!(join_under(base, "/etc/ci1"), PathBuf::from("/work/out/etc/ci1"));
        assert_eq!(join_under(base, "../../ci1"), PathBuf::from("/work/out/ci1"));
        assert_eq!(join_under(base, ".."), PathBuf::from("/work/out"));
    }

    #[test]
    fn test_rename_config_requires_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(RenameConfig::new(temp.path()).validate().is_ok());
        assert!(RenameConfig::new(temp.path().join("missing")).validate().is_err());

        let file = temp.child("a.yaml");
        file.write_str("kind: Service").unwrap();
        assert!(RenameConfig::new(file.path()).validate().is_err());
    }
}
