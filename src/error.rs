use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the gitops-utl library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Invalid options supplied to a command.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// A YAML document could not be parsed.
    #[error("Failed to load file '{path}': {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Template evaluation error.
    #[error("Failed to evaluate template '{template}': {message}")]
    Template {
        /// Template file path
        template: String,
        /// Error message
        message: String,
    },

    /// A template file referenced by configuration does not exist.
    #[error("The {kind} file '{path}' does not exist")]
    TemplateNotFound {
        /// Which option referenced the file
        kind: &'static str,
        /// Missing path
        path: PathBuf,
    },

    /// YAML serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// A file could not be renamed.
    #[error("Failed to rename '{from}' to '{to}': {message}")]
    Rename {
        /// Original file name
        from: String,
        /// Target file name
        to: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a parse error for a YAML file.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, source: &serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a template error.
    ///
    /// Tera nests the useful detail in the source chain, so the whole chain
    /// is flattened into the message.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = std::error::Error::source(inner);
        }
        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates a missing template file error.
    #[must_use]
    pub fn template_not_found(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::TemplateNotFound {
            kind,
            path: path.into(),
        }
    }

    /// Creates a rename error.
    #[must_use]
    pub fn rename(from: impl Into<String>, to: impl Into<String>, source: std::io::Error) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            message: source.to_string(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is a YAML parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns true if a referenced template file was missing.
    #[must_use]
    pub const fn is_template_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }

    /// Returns true if renaming a file failed.
    #[must_use]
    pub const fn is_rename(&self) -> bool {
        matches!(self, Self::Rename { .. })
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/test.txt", io_err);
        assert!(err.is_io());
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn test_template_not_found_names_path() {
        let err = Error::template_not_found("xmlTemplate", "/work/jobs/missing.xml");
        assert!(err.is_template_not_found());
        assert_eq!(
            err.to_string(),
            "The xmlTemplate file '/work/jobs/missing.xml' does not exist"
        );
    }

    #[test]
    fn test_rename_error_names_both_files() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::rename("a.yaml", "a-svc.yaml", io_err);
        let msg = err.to_string();
        assert!(msg.contains("a.yaml"));
        assert!(msg.contains("a-svc.yaml"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_parse_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err = Error::parse("config.yaml", &yaml_err);
        assert!(err.is_parse());
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_template_error_includes_cause() {
        let mut tera = tera::Tera::default();
        let tera_err = tera.add_raw_template("job.xml", "{% if %}").unwrap_err();
        let err = Error::template("job.xml", &tera_err);
        assert!(err.to_string().contains("job.xml"));
    }

    #[test]
    fn test_error_clone() {
        let err = Error::config("test");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
