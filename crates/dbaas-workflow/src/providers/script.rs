use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExecutionFailure;
use crate::traits::{DriverParams, RemoteExecutor};

/// Runs driver actions as `<script> <action>`, passing each parameter as an
/// environment variable of the same name.
///
/// The action succeeds when the script exits with status zero; its stdout is
/// the action's output. Anything else is an [`ExecutionFailure`] carrying
/// stdout and stderr, which the caller classifies by content.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    script: PathBuf,
}

impl ScriptExecutor {
    #[must_use]
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }

    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }
}

#[async_trait]
impl RemoteExecutor for ScriptExecutor {
    async fn execute(
        &self,
        action: &str,
        params: &DriverParams,
    ) -> Result<String, ExecutionFailure> {
        debug!(script = %self.script.display(), action, "running driver action");

        let output = Command::new(&self.script)
            .arg(action)
            .envs(params)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| ExecutionFailure {
                action: action.to_string(),
                exit_code: None,
                output: format!("could not start {}: {error}", self.script.display()),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            if !stderr.is_empty() {
                debug!(action, stderr = %stderr.trim(), "driver stderr");
            }
            return Ok(stdout);
        }

        let exit_code = output.status.code();
        warn!(action, ?exit_code, "driver action failed");
        let combined = if stderr.is_empty() {
            stdout
        } else if stdout.is_empty() {
            stderr.into_owned()
        } else {
            format!("{stdout}\n{stderr}")
        };
        Err(ExecutionFailure {
            action: action.to_string(),
            exit_code,
            output: combined,
        })
    }
}
