//! Renames Kubernetes YAML manifests to canonical file names derived from
//! the resource name and kind, e.g. a `Service` named `foo` becomes
//! `foo-svc.yaml`.

use crate::{
    config::RenameConfig,
    error::{Error, Result},
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, warn};
use walkdir::WalkDir;

/// Abbreviations used as file name suffixes, keyed by lower-cased kind.
static KIND_SUFFIXES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("clusterrolebinding", "crb"),
        ("configmap", "cm"),
        ("customresourcedefinition", "crd"),
        ("deployment", "deploy"),
        ("mutatingwebhookconfiguration", "mutwebhookcfg"),
        ("namespace", "ns"),
        ("rolebinding", "rb"),
        ("service", "svc"),
        ("serviceaccount", "sa"),
        ("validatingwebhookconfiguration", "valwebhookcfg"),
    ]
    .into_iter()
    .collect()
});

/// Returns the canonical base file name of a resource.
///
/// An empty kind leaves the name unchanged. Otherwise the lower-cased kind is
/// abbreviated when it is a well known kind and appended as `-<suffix>`.
///
/// # Examples
///
/// ```
/// use gitops_utl::canonical_name;
///
/// assert_eq!(canonical_name("Service", "foo"), "foo-svc");
/// assert_eq!(canonical_name("Widget", "foo"), "foo-widget");
/// assert_eq!(canonical_name("", "foo"), "foo");
/// ```
#[must_use]
pub fn canonical_name(kind: &str, name: &str) -> String {
    if kind.is_empty() {
        return name.to_string();
    }
    let lower = kind.to_lowercase();
    let suffix = KIND_SUFFIXES.get(lower.as_str()).copied().unwrap_or(lower.as_str());
    format!("{name}-{suffix}")
}

/// Statistics collected during a rename run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenameStats {
    /// Regular files visited
    pub files_scanned: usize,

    /// Files with a `.yaml` or `.yml` extension
    pub yaml_files: usize,

    /// Files that were renamed
    pub renamed: usize,

    /// YAML files skipped because no resource name was found
    pub skipped: usize,

    /// Total execution time
    pub duration: Duration,
}

impl RenameStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!(
            "Renamed {} of {} YAML file(s) ({} without a resource name)",
            self.renamed, self.yaml_files, self.skipped
        );
    }
}

/// Walks a directory and renames YAML files to their canonical names.
pub struct Renamer {
    config: RenameConfig,
}

impl Renamer {
    /// Creates a renamer for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist.
    pub fn new(config: RenameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Renames every YAML file below the configured directory.
    ///
    /// The file list is gathered before anything is renamed. A second run
    /// over the same tree renames nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a YAML file cannot be read or parsed, or if a
    /// rename fails. Files renamed before the failure keep their new names.
    #[instrument(skip(self), fields(dir = %self.config.dir.display()))]
    pub fn run(&self) -> Result<RenameStats> {
        let start_time = Instant::now();
        let mut stats = RenameStats::default();

        for path in self.files() {
            stats.files_scanned += 1;
            let Some(ext) = yaml_extension(&path) else {
                continue;
            };
            stats.yaml_files += 1;

            match rename_file(&path, ext)? {
                RenameOutcome::Renamed(new_path) => {
                    trace!("{} -> {}", path.display(), new_path.display());
                    stats.renamed += 1;
                }
                RenameOutcome::NoName => stats.skipped += 1,
                RenameOutcome::Unchanged => {}
            }
        }

        stats.duration = start_time.elapsed();
        debug!(
            "Rename complete: {} files, {} yaml, {} renamed, {} skipped",
            stats.files_scanned, stats.yaml_files, stats.renamed, stats.skipped
        );
        Ok(stats)
    }

    /// Collects all non-directory entries below the configured directory.
    fn files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.config.dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Walk error: {}", e);
                    None
                }
            })
            .filter(|entry| !entry.file_type().is_dir())
            .map(walkdir::DirEntry::into_path)
            .collect()
    }
}

/// Returns the YAML suffix of a file name, if it has one.
fn yaml_extension(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?;
    [".yaml", ".yml"].into_iter().find(|ext| name.ends_with(ext))
}

/// What happened to a single YAML file.
#[derive(Debug, PartialEq, Eq)]
enum RenameOutcome {
    Renamed(PathBuf),
    Unchanged,
    NoName,
}

/// Renames one YAML file if its canonical name differs.
fn rename_file(path: &Path, ext: &str) -> Result<RenameOutcome> {
    let doc = read_first_document(path)?;

    let Some(name) = string_field(&doc, &["metadata", "name"], path) else {
        warn!("no name for file {} so ignoring", path.display());
        return Ok(RenameOutcome::NoName);
    };
    let kind = string_field(&doc, &["kind"], path).unwrap_or_default();

    let new_file = format!("{}{}", canonical_name(&kind, &name), ext);
    let new_path = path.with_file_name(&new_file);

    if new_path == path {
        return Ok(RenameOutcome::Unchanged);
    }

    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!("renaming {} => {}", file, new_file);
    fs::rename(path, &new_path).map_err(|e| Error::rename(file, new_file, e))?;

    Ok(RenameOutcome::Renamed(new_path))
}

/// Parses the first YAML document of a file. An empty file yields `Null`.
fn read_first_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    match serde_yaml::Deserializer::from_str(&content).next() {
        Some(document) => Value::deserialize(document).map_err(|e| Error::parse(path, &e)),
        None => Ok(Value::Null),
    }
}

/// Looks up a non-empty string at `field_path`.
///
/// A value of another type is reported with the file path and treated as
/// missing.
fn string_field(doc: &Value, field_path: &[&str], path: &Path) -> Option<String> {
    let mut value = doc;
    for key in field_path {
        value = value.get(*key)?;
    }

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            warn!(
                "field {} in file {} is not a string: {:?}",
                field_path.join("."),
                path.display(),
                other
            );
            None
        }
    }
}
