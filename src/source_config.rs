//! Source repository configuration: the groups of repositories a GitOps
//! cluster builds, and the group → repository defaulting rules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// File name of the source config inside `.jx/gitops`.
pub const SOURCE_CONFIG_FILE_NAME: &str = "source-config.yaml";

/// Git provider used when a group does not name one.
pub const DEFAULT_PROVIDER: &str = "https://github.com";

/// Root source configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// API version of the document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Resource kind of the document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Resource metadata; only kept for round trips
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_yaml::Value>,

    /// Configuration body
    #[serde(default)]
    pub spec: SourceConfigSpec,
}

/// Body of a [`SourceConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfigSpec {
    /// Groups of repositories, in declaration order
    #[serde(default)]
    pub groups: Vec<RepositoryGroup>,
}

/// Repositories sharing an owner and git provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryGroup {
    /// Organisation or user owning the repositories
    #[serde(default)]
    pub owner: String,

    /// Git server URL
    #[serde(default)]
    pub provider: String,

    /// Kind of git server, e.g. `github`
    #[serde(default)]
    pub provider_kind: String,

    /// Name of the git server
    #[serde(default)]
    pub provider_name: String,

    /// Jenkins settings inherited by repositories that have a `jenkins` block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenkins: Option<JenkinsConfig>,

    /// Repositories in this group, in declaration order
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

/// A single source repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Repository name; also the Jenkins job key
    #[serde(default)]
    pub name: String,

    /// Browser URL of the repository
    #[serde(default)]
    pub url: String,

    /// HTTPS clone URL
    #[serde(default, rename = "httpCloneURL")]
    pub http_clone_url: String,

    /// Jenkins settings; `None` when the repository is not built by Jenkins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenkins: Option<JenkinsConfig>,
}

/// Jenkins settings of a repository or group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsConfig {
    /// Jenkins server the job is generated for; empty means skip
    #[serde(default)]
    pub server: String,

    /// Job XML template relative to the working directory
    #[serde(default)]
    pub xml_template: String,
}

/// Loads the source config at `path`.
///
/// A missing file is not an error: it yields an empty configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<SourceConfig> {
    if !path.is_file() {
        info!("the source config file {} does not exist", path.display());
        return Ok(SourceConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    if content.trim().is_empty() {
        debug!("source config {} is empty", path.display());
        return Ok(SourceConfig::default());
    }

    let config: SourceConfig =
        serde_yaml::from_str(&content).map_err(|e| Error::parse(path, &e))?;

    debug!(
        "loaded {} group(s) from {}",
        config.spec.groups.len(),
        path.display()
    );
    Ok(config)
}

/// Applies group defaults to a repository, filling only its unset fields.
///
/// The group itself is defaulted first so that derived values (URLs, kinds)
/// see the provider the group ends up with.
pub fn default_values(group: &mut RepositoryGroup, repo: &mut Repository) {
    if group.provider.is_empty() {
        group.provider = DEFAULT_PROVIDER.to_string();
    }
    if group.provider_kind.is_empty() {
        group.provider_kind = provider_kind_for(&group.provider).to_string();
    }
    if group.provider_name.is_empty() {
        group.provider_name = group.provider_kind.clone();
    }

    if repo.url.is_empty() {
        repo.url = url_join(&[&group.provider, &group.owner, &repo.name]);
    }
    if repo.http_clone_url.is_empty() {
        repo.http_clone_url = if repo.url.ends_with(".git") {
            repo.url.clone()
        } else {
            format!("{}.git", repo.url)
        };
    }

    if let (Some(jenkins), Some(group_jenkins)) = (repo.jenkins.as_mut(), group.jenkins.as_ref()) {
        if jenkins.server.is_empty() {
            jenkins.server = group_jenkins.server.clone();
        }
        if jenkins.xml_template.is_empty() {
            jenkins.xml_template = group_jenkins.xml_template.clone();
        }
    }
}

/// Infers the provider kind from well known hosts.
fn provider_kind_for(provider: &str) -> &'static str {
    let host = provider
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or_default();

    match host {
        "github.com" => "github",
        "gitlab.com" => "gitlab",
        "bitbucket.org" => "bitbucketcloud",
        _ => "",
    }
}

/// Joins URL segments with exactly one `/` between them.
fn url_join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
