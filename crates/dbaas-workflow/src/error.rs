use std::path::PathBuf;

use dbaas_saga::{ErrorCode, StepFailure};
use thiserror::Error;

use crate::classify;

/// Code recorded when granting or revoking NFS access fails for a reason
/// the collaborator output does not explain.
pub const NFS_ACCESS_CODE: ErrorCode = ErrorCode::domain("DBAAS_0021");

/// A driver script ran but did not succeed, or could not be started.
#[derive(Debug, Clone, Error)]
#[error("driver action '{action}' failed ({})", exit_label(.exit_code))]
pub struct ExecutionFailure {
    pub action: String,
    /// Exit status of the script; `None` if it was killed or never started.
    pub exit_code: Option<i32>,
    /// Everything the script wrote to stdout and stderr.
    pub output: String,
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

/// Failure reported by an infrastructure collaborator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("could not connect: {output}")]
    Connection {
        output: String,
        #[source]
        source: ExecutionFailure,
    },

    #[error("authentication failed: {output}")]
    Authentication {
        output: String,
        #[source]
        source: ExecutionFailure,
    },

    #[error("resource already exists: {output}")]
    AlreadyExists {
        output: String,
        #[source]
        source: ExecutionFailure,
    },

    #[error("resource not found: {output}")]
    NotFound {
        output: String,
        #[source]
        source: ExecutionFailure,
    },

    #[error(transparent)]
    Execution(ExecutionFailure),

    #[error("{operation} rejected: {reason}")]
    Rejected { operation: String, reason: String },
}

impl From<ExecutionFailure> for ProviderError {
    /// Classify a failed script by what it printed, not by its exit code.
    /// A script that never started printed nothing, so it stays unclassified.
    fn from(failure: ExecutionFailure) -> Self {
        if failure.exit_code.is_none() {
            return Self::Execution(failure);
        }
        let output = failure.output.trim().to_string();
        match classify::classify(&failure.output) {
            Some(ErrorCode::Connection) => Self::Connection {
                output,
                source: failure,
            },
            Some(ErrorCode::Authentication) => Self::Authentication {
                output,
                source: failure,
            },
            Some(ErrorCode::AlreadyExists) => Self::AlreadyExists {
                output,
                source: failure,
            },
            Some(ErrorCode::NotFound) => Self::NotFound {
                output,
                source: failure,
            },
            _ => Self::Execution(failure),
        }
    }
}

impl ProviderError {
    /// The classified code, if the failure matched a known cause.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Connection { .. } => Some(ErrorCode::Connection),
            Self::Authentication { .. } => Some(ErrorCode::Authentication),
            Self::AlreadyExists { .. } => Some(ErrorCode::AlreadyExists),
            Self::NotFound { .. } => Some(ErrorCode::NotFound),
            Self::Execution(_) | Self::Rejected { .. } => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Convert into a step failure, using `fallback` when unclassified.
    #[must_use]
    pub fn into_step_failure(self, fallback: ErrorCode) -> StepFailure {
        let code = self.code().unwrap_or(fallback);
        StepFailure::from_error(code, &self)
    }
}

/// Caller input that cannot describe a runnable workflow. Reported before
/// any step runs.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown workflow '{name}' (available: {available})")]
    UnknownWorkflow { name: String, available: String },

    #[error("instance field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("instance port must be greater than zero")]
    InvalidPort,

    #[error("workflow '{workflow}' requires a [database] section")]
    MissingDatabase { workflow: &'static str },

    #[error("workflow '{workflow}' requires a [credential] section")]
    MissingCredential { workflow: &'static str },

    #[error("workflow '{workflow}' requires at least one [[bindings]] entry")]
    NoBindings { workflow: &'static str },
}

/// Failure to load a run file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read run file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(output: &str) -> ExecutionFailure {
        ExecutionFailure {
            action: "status".to_string(),
            exit_code: Some(1),
            output: output.to_string(),
        }
    }

    #[test]
    fn execution_failure_names_action_and_exit_code() {
        assert_eq!(
            failure("boom").to_string(),
            "driver action 'status' failed (exit code 1)"
        );

        let killed = ExecutionFailure {
            exit_code: None,
            ..failure("")
        };
        assert_eq!(
            killed.to_string(),
            "driver action 'status' failed (no exit code)"
        );
    }

    #[test]
    fn execution_failures_are_classified_by_output() {
        let error = ProviderError::from(failure(
            "Error: couldn't connect to server 10.0.0.1:27017 at src/mongo/shell/mongo.js:147",
        ));
        assert_eq!(error.code(), Some(ErrorCode::Connection));

        let error = ProviderError::from(failure("Error: 18 { code: 18, ok: 0.0, errmsg: \"auth fails\" }"));
        assert_eq!(error.code(), Some(ErrorCode::Authentication));

        let error = ProviderError::from(failure("segmentation fault"));
        assert_eq!(error.code(), None);
    }

    #[test]
    fn script_that_never_started_is_unclassified() {
        let error = ProviderError::from(ExecutionFailure {
            action: "dropdatabase".to_string(),
            exit_code: None,
            output: "could not start /opt/driver.sh: No such file or directory (os error 2)"
                .to_string(),
        });

        assert!(!error.is_not_found());
        assert_eq!(error.code(), None);
    }

    #[test]
    fn step_failure_uses_fallback_only_when_unclassified() {
        let classified = ProviderError::from(failure("database does not exist"));
        assert!(classified.is_not_found());
        assert_eq!(
            classified.into_step_failure(NFS_ACCESS_CODE).code(),
            &ErrorCode::NotFound
        );

        let unclassified = ProviderError::Rejected {
            operation: "grant".to_string(),
            reason: "quota exceeded".to_string(),
        };
        let step_failure = unclassified.into_step_failure(NFS_ACCESS_CODE);
        assert_eq!(step_failure.code(), &NFS_ACCESS_CODE);
        assert_eq!(step_failure.message(), "grant rejected: quota exceeded");
    }

    #[test]
    fn step_failure_message_includes_source_chain() {
        let error = ProviderError::from(failure("couldn't connect to server"));

        let step_failure = error.into_step_failure(ErrorCode::Unclassified);

        assert_eq!(
            step_failure.message(),
            "could not connect: couldn't connect to server: driver action 'status' failed (exit code 1)"
        );
    }
}
