use crate::{
    config::join_under,
    error::{Error, Result},
    source_config::{self, JenkinsConfig, Repository, RepositoryGroup, SourceConfig},
    template::TemplateData,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything needed to render one Jenkins job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsTemplateConfig {
    /// Jenkins server the job belongs to
    pub server: String,

    /// Job key in the generated values; the repository name
    pub key: String,

    /// Resolved template path, used in error messages
    pub xml_template_file: PathBuf,

    /// Raw template text
    pub xml_template_text: String,

    /// Variables the template is evaluated against
    pub template_data: TemplateData,
}

/// Job configs grouped by Jenkins server name.
///
/// Servers iterate in name order; jobs keep the order repositories were
/// processed in.
#[derive(Debug, Default, Clone)]
pub struct JenkinsServers {
    servers: BTreeMap<String, Vec<JenkinsTemplateConfig>>,
}

impl JenkinsServers {
    /// Creates an empty grouping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job config to its server's list.
    pub fn push(&mut self, config: JenkinsTemplateConfig) {
        self.servers
            .entry(config.server.clone())
            .or_default()
            .push(config);
    }

    /// Returns the job configs of `server`.
    #[must_use]
    pub fn get(&self, server: &str) -> Option<&[JenkinsTemplateConfig]> {
        self.servers.get(server).map(Vec::as_slice)
    }

    /// Iterates servers with their job configs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[JenkinsTemplateConfig])> {
        self.servers
            .iter()
            .map(|(server, configs)| (server.as_str(), configs.as_slice()))
    }

    /// Number of servers with at least one job.
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true if no job was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Total number of job configs across servers.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.servers.values().map(Vec::len).sum()
    }
}

/// Counters gathered while walking the source config.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CollectStats {
    pub(crate) groups: usize,
    pub(crate) repositories: usize,
    pub(crate) skipped: usize,
}

/// What happened to a single repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Added,
    Skipped,
}

/// Resolves job templates for repositories and groups them by server.
pub(crate) struct JobCollector<'a> {
    dir: &'a Path,
    default_xml_template: Option<&'a Path>,
}

impl<'a> JobCollector<'a> {
    pub(crate) fn new(dir: &'a Path, default_xml_template: Option<&'a Path>) -> Self {
        Self {
            dir,
            default_xml_template,
        }
    }

    /// Applies defaults to every repository and collects its job config.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced template is missing or unreadable.
    pub(crate) fn collect(
        &self,
        config: &mut SourceConfig,
    ) -> Result<(JenkinsServers, CollectStats)> {
        let mut servers = JenkinsServers::new();
        let mut stats = CollectStats::default();

        for group in &mut config.spec.groups {
            stats.groups += 1;

            // repositories are taken out so the group can be defaulted alongside them
            let mut repositories = std::mem::take(&mut group.repositories);
            for repo in &mut repositories {
                stats.repositories += 1;
                source_config::default_values(group, repo);

                let Some(jenkins) = repo.jenkins.as_ref() else {
                    continue;
                };

                if self.process(group, repo, jenkins, &mut servers)? == Outcome::Skipped {
                    stats.skipped += 1;
                }
            }
            group.repositories = repositories;
        }

        Ok((servers, stats))
    }

    /// Resolves the template for one repository and records its job config.
    fn process(
        &self,
        group: &RepositoryGroup,
        repo: &Repository,
        jenkins: &JenkinsConfig,
        servers: &mut JenkinsServers,
    ) -> Result<Outcome> {
        if jenkins.server.is_empty() {
            info!("ignoring repository {} as it has no Jenkins server defined", repo.url);
            return Ok(Outcome::Skipped);
        }

        let xml_template = if jenkins.xml_template.is_empty() {
            self.default_xml_template.map(Path::to_path_buf)
        } else {
            let path = join_under(self.dir, &jenkins.xml_template);
            if !path.is_file() {
                return Err(Error::template_not_found("xmlTemplate", path));
            }
            Some(path)
        };

        // an unresolved template reports the same message as a missing server
        let Some(xml_template) = xml_template else {
            info!("ignoring repository {} as it has no Jenkins server defined", repo.url);
            return Ok(Outcome::Skipped);
        };

        let text = fs::read_to_string(&xml_template).map_err(|e| Error::io(&xml_template, e))?;

        if servers
            .get(&jenkins.server)
            .is_some_and(|jobs| jobs.iter().any(|job| job.key == repo.name))
        {
            debug!(
                "repository {} appears more than once for Jenkins server {}; the last one wins",
                repo.name, jenkins.server
            );
        }

        debug!(
            "adding job {} to Jenkins server {} using {}",
            repo.name,
            jenkins.server,
            xml_template.display()
        );

        servers.push(JenkinsTemplateConfig {
            server: jenkins.server.clone(),
            key: repo.name.clone(),
            xml_template_file: xml_template,
            xml_template_text: text,
            template_data: template_data(group, repo),
        });

        Ok(Outcome::Added)
    }
}

/// Builds the variables available to a repository's job template.
#[must_use]
pub fn template_data(group: &RepositoryGroup, repo: &Repository) -> TemplateData {
    [
        ("Owner", &group.owner),
        ("GitServerURL", &group.provider),
        ("GitKind", &group.provider_kind),
        ("GitName", &group.provider_name),
        ("Repository", &repo.name),
        ("URL", &repo.url),
        ("CloneURL", &repo.http_clone_url),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.clone()))
    .collect()
}
