use async_trait::async_trait;

use crate::error::ProviderError;

/// Grants and revokes host access to NFS exports.
#[async_trait]
pub trait AccessProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    async fn grant_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError>;

    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached. A
    /// grant that no longer exists is reported as `ProviderError::NotFound`.
    async fn revoke_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError>;
}
