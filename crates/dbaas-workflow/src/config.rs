use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::orchestrator::WorkflowParams;
use crate::types::{CredentialSpec, DatabaseSpec, HostExport, Instance};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRunFile {
    engine: RawEngine,
    instance: Instance,
    database: Option<DatabaseSpec>,
    credential: Option<CredentialSpec>,
    #[serde(default)]
    bindings: Vec<HostExport>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngine {
    script: PathBuf,
    step_timeout_secs: Option<u64>,
}

/// Engine settings of a run file.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    script: PathBuf,
    step_timeout: Option<Duration>,
}

impl EngineConfig {
    /// Driver script that every collaborator call goes through.
    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }

    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }
}

/// A parsed run file: engine settings plus the workflow inputs.
///
/// ```toml
/// [engine]
/// script = "driver.sh"
/// step_timeout_secs = 30
///
/// [instance]
/// environment = "prod"
/// hostname = "db-01"
/// dns = "db-01.example.internal"
/// address = "10.0.0.7"
/// port = 27017
/// user = "admin"
/// password = "secret"
///
/// [[bindings]]
/// host = "host-a"
/// export_id = "export-1"
/// ```
#[derive(Debug, Clone)]
pub struct RunFile {
    engine: EngineConfig,
    params: WorkflowParams,
}

impl RunFile {
    /// Load a run file. A relative `script` is resolved against the
    /// directory containing the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid run file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse run file content, resolving a relative script against `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid run file.
    pub fn parse(content: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let raw: RawRunFile = toml::from_str(content)?;
        let script = if raw.engine.script.is_relative() {
            base.join(&raw.engine.script)
        } else {
            raw.engine.script
        };

        let mut params = WorkflowParams::new(raw.instance).with_bindings(raw.bindings);
        params.database = raw.database;
        params.credential = raw.credential;

        Ok(Self {
            engine: EngineConfig {
                script,
                step_timeout: raw.engine.step_timeout_secs.map(Duration::from_secs),
            },
            params,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    #[must_use]
    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    #[must_use]
    pub fn into_params(self) -> WorkflowParams {
        self.params
    }

    /// Replace the file's step timeout, e.g. from a command line flag.
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.engine.step_timeout = Some(timeout);
        self
    }
}
