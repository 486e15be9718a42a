use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::ExecutionFailure;

/// Named parameters for a driver action, in the order they were added.
pub type DriverParams = IndexMap<String, String>;

/// Runs a named action of the database engine driver.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run `action` with `params` and return its output.
    ///
    /// # Errors
    ///
    /// Returns the exit indicator and captured output if the action could
    /// not be started or did not succeed.
    async fn execute(&self, action: &str, params: &DriverParams)
    -> Result<String, ExecutionFailure>;
}
