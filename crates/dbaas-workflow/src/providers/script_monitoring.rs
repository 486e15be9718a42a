use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ProviderError;
use crate::traits::{DriverParams, MonitoringProvider, MonitoringSession, RemoteExecutor};
use crate::types::Instance;

/// Talks to the monitoring system through driver actions.
///
/// `monitoringlogin` prints a session token on stdout; every later call of
/// the session passes it back as `MONITORING_SESSION`.
pub struct ScriptMonitoringProvider<E> {
    executor: Arc<E>,
}

impl<E> ScriptMonitoringProvider<E> {
    #[must_use]
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<E: RemoteExecutor + 'static> MonitoringProvider for ScriptMonitoringProvider<E> {
    async fn open_session(
        &self,
        environment: &str,
    ) -> Result<Box<dyn MonitoringSession>, ProviderError> {
        let params = DriverParams::from([("ENVIRONMENT".to_string(), environment.to_string())]);
        let token = self.executor.execute("monitoringlogin", &params).await?;
        info!(environment, "opened monitoring session");
        Ok(Box::new(ScriptMonitoringSession {
            executor: Arc::clone(&self.executor),
            environment: environment.to_string(),
            token: token.trim().to_string(),
        }))
    }
}

struct ScriptMonitoringSession<E> {
    executor: Arc<E>,
    environment: String,
    token: String,
}

impl<E: RemoteExecutor> ScriptMonitoringSession<E> {
    fn params(&self) -> DriverParams {
        DriverParams::from([
            ("ENVIRONMENT".to_string(), self.environment.clone()),
            ("MONITORING_SESSION".to_string(), self.token.clone()),
        ])
    }

    fn instance_params(&self, instance: &Instance) -> DriverParams {
        let mut params = self.params();
        params.insert("HOSTNAME".to_string(), instance.hostname.clone());
        params.insert("DNS".to_string(), instance.dns.clone());
        params.insert("ADDRESS".to_string(), instance.address.clone());
        params.insert("PORT".to_string(), instance.port.to_string());
        params
    }

    async fn run(&self, action: &str, params: &DriverParams) -> Result<String, ProviderError> {
        Ok(self.executor.execute(action, params).await?)
    }
}

#[async_trait]
impl<E: RemoteExecutor> MonitoringSession for ScriptMonitoringSession<E> {
    async fn host_triggers(&self, host: &str) -> Result<Vec<String>, ProviderError> {
        let mut params = self.params();
        params.insert("HOST".to_string(), host.to_string());
        let output = self.run("hosttriggers", &params).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    async fn delete_instance_monitors(&self, host: &str) -> Result<(), ProviderError> {
        let mut params = self.params();
        params.insert("HOST".to_string(), host.to_string());
        self.run("deletemonitors", &params).await?;
        Ok(())
    }

    async fn create_basic_monitors(&self, instance: &Instance) -> Result<(), ProviderError> {
        self.run("createbasicmonitors", &self.instance_params(instance))
            .await?;
        Ok(())
    }

    async fn create_instance_monitors(&self, instance: &Instance) -> Result<(), ProviderError> {
        self.run("createinstancemonitors", &self.instance_params(instance))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ProviderError> {
        self.run("monitoringlogout", &self.params()).await?;
        debug!(environment = %self.environment, "closed monitoring session");
        Ok(())
    }
}
