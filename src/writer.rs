use crate::{
    config::join_under,
    error::{Error, Result},
    jobs::{JenkinsServers, JenkinsTemplateConfig},
    template::TemplateEngine,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// File written into each server directory.
pub const VALUES_FILE_NAME: &str = "values.yaml";

/// Helm values for the Jenkins chart.
#[derive(Debug, Serialize)]
struct Values<'a> {
    master: Master<'a>,
}

#[derive(Debug, Serialize)]
struct Master<'a> {
    jobs: BTreeMap<&'a str, String>,
}

/// Renders job templates and writes one `values.yaml` per Jenkins server.
pub(crate) struct ValuesWriter {
    out_dir: PathBuf,
    engine: TemplateEngine,
}

impl ValuesWriter {
    /// Creates a writer targeting `out_dir`.
    pub(crate) fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            engine: TemplateEngine::new(),
        }
    }

    /// Writes the values file of every server and returns the paths written.
    ///
    /// Stops at the first failure; files written before it stay on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A server directory cannot be created
    /// - A template fails to evaluate
    /// - The values cannot be serialized or written
    pub(crate) fn write_servers(&mut self, servers: &JenkinsServers) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(servers.len());
        for (server, configs) in servers.iter() {
            written.push(self.write_server(server, configs)?);
        }
        Ok(written)
    }

    /// Renders and writes the values file of a single server.
    fn write_server(&mut self, server: &str, configs: &[JenkinsTemplateConfig]) -> Result<PathBuf> {
        let dir = join_under(&self.out_dir, server);
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let path = dir.join(VALUES_FILE_NAME);
        info!("creating Jenkins values.yaml file {}", path.display());

        let content = render_values(&mut self.engine, configs)?;
        write_file_atomic(&path, &content)?;

        debug!(
            "Wrote {} job(s) for Jenkins server {} to {}",
            configs.len(),
            server,
            path.display()
        );

        Ok(path)
    }
}

/// Evaluates every job template and serializes the Helm values document.
///
/// Jobs sharing a key overwrite each other; the last one in `configs` wins.
///
/// # Errors
///
/// Returns an error if a template fails to evaluate or serialization fails.
pub(crate) fn render_values(
    engine: &mut TemplateEngine,
    configs: &[JenkinsTemplateConfig],
) -> Result<String> {
    let mut jobs = BTreeMap::new();

    for config in configs {
        let template = config.xml_template_file.to_string_lossy();
        let output = engine.render(&template, &config.xml_template_text, &config.template_data)?;
        jobs.insert(config.key.as_str(), output);
    }

    let values = Values {
        master: Master { jobs },
    };

    Ok(serde_yaml::to_string(&values)?)
}

/// Writes a file by renaming a synced temporary sibling over it.
fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}
