use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not load run file")]
    Config(#[from] dbaas_workflow::ConfigError),

    #[error("invalid workflow parameters")]
    Configuration(#[from] dbaas_workflow::ConfigurationError),

    #[error("driver script '{0}' does not exist")]
    MissingScript(PathBuf),

    #[error("could not serialize output")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
