use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::Instance;

/// Entry point to the monitoring system.
#[async_trait]
pub trait MonitoringProvider: Send + Sync {
    /// Log in to the monitoring system for `environment`.
    ///
    /// The caller owns the returned session and must `close` it on every
    /// exit path; dropping a session does not log out.
    ///
    /// # Errors
    ///
    /// Returns an error if the login is rejected or the system is unreachable.
    async fn open_session(
        &self,
        environment: &str,
    ) -> Result<Box<dyn MonitoringSession>, ProviderError>;
}

/// A logged-in monitoring session.
#[async_trait]
pub trait MonitoringSession: Send + Sync {
    /// Names of the triggers currently defined for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn host_triggers(&self, host: &str) -> Result<Vec<String>, ProviderError>;

    /// # Errors
    ///
    /// Returns an error if the monitors cannot be deleted.
    async fn delete_instance_monitors(&self, host: &str) -> Result<(), ProviderError>;

    /// Create host level monitors (reachability, load) for the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitors cannot be created.
    async fn create_basic_monitors(&self, instance: &Instance) -> Result<(), ProviderError>;

    /// Create database engine monitors for the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitors cannot be created.
    async fn create_instance_monitors(&self, instance: &Instance) -> Result<(), ProviderError>;

    /// Log out.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout call fails.
    async fn close(&self) -> Result<(), ProviderError>;
}
