use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::{AccessProvider, DriverParams, RemoteExecutor};

/// Grants NFS access through the `grantaccess` and `revokeaccess` driver
/// actions.
pub struct ScriptAccessProvider<E> {
    executor: Arc<E>,
}

impl<E> ScriptAccessProvider<E> {
    #[must_use]
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }
}

fn access_params(environment: &str, host: &str, export_id: &str) -> DriverParams {
    DriverParams::from([
        ("ENVIRONMENT".to_string(), environment.to_string()),
        ("HOST".to_string(), host.to_string()),
        ("EXPORT_ID".to_string(), export_id.to_string()),
    ])
}

#[async_trait]
impl<E: RemoteExecutor> AccessProvider for ScriptAccessProvider<E> {
    async fn grant_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError> {
        self.executor
            .execute("grantaccess", &access_params(environment, host, export_id))
            .await?;
        debug!(host, export_id, "granted nfs access");
        Ok(())
    }

    async fn revoke_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError> {
        self.executor
            .execute("revokeaccess", &access_params(environment, host, export_id))
            .await?;
        debug!(host, export_id, "revoked nfs access");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockExecutor;

    #[tokio::test]
    async fn grant_passes_host_and_export() {
        let executor = Arc::new(MockExecutor::new());
        let provider = ScriptAccessProvider::new(Arc::clone(&executor));

        provider
            .grant_access("prod", "host-a", "export-1")
            .await
            .expect("grant should succeed");

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        let (action, params) = &calls[0];
        assert_eq!(action, "grantaccess");
        assert_eq!(params.get("ENVIRONMENT").map(String::as_str), Some("prod"));
        assert_eq!(params.get("HOST").map(String::as_str), Some("host-a"));
        assert_eq!(params.get("EXPORT_ID").map(String::as_str), Some("export-1"));
    }

    #[tokio::test]
    async fn missing_grant_is_reported_as_not_found() {
        let executor =
            Arc::new(MockExecutor::new().fail_on("revokeaccess", "export rule does not exist"));
        let provider = ScriptAccessProvider::new(executor);

        let error = provider
            .revoke_access("prod", "host-a", "export-1")
            .await
            .expect_err("revoke should fail");

        assert!(error.is_not_found());
    }
}
