use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ExecutionFailure, ProviderError};
use crate::traits::{
    AccessProvider, DriverParams, MonitoringProvider, MonitoringSession, RemoteExecutor,
};
use crate::types::{CredentialSpec, DatabaseSpec, HostExport, Instance};

fn scripted_failure(action: &str, output: &str) -> ExecutionFailure {
    ExecutionFailure {
        action: action.to_string(),
        exit_code: Some(1),
        output: output.to_string(),
    }
}

#[must_use]
pub fn make_instance() -> Instance {
    Instance {
        environment: "dev".to_string(),
        hostname: "db-01".to_string(),
        dns: "db-01.example.internal".to_string(),
        address: "10.0.0.7".to_string(),
        port: 27017,
        user: "admin".to_string(),
        password: "admin-secret".to_string(),
    }
}

#[must_use]
pub fn make_database() -> DatabaseSpec {
    DatabaseSpec {
        name: "orders".to_string(),
    }
}

#[must_use]
pub fn make_credential() -> CredentialSpec {
    CredentialSpec {
        user: "orders_app".to_string(),
        password: "app-secret".to_string(),
    }
}

#[must_use]
pub fn make_bindings() -> Vec<HostExport> {
    vec![
        HostExport::new("host-a", "export-1"),
        HostExport::new("host-b", "export-2"),
    ]
}

pub struct MockExecutor {
    outputs: HashMap<String, String>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, DriverParams)>>,
}

impl MockExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_output(mut self, action: &str, output: &str) -> Self {
        self.outputs.insert(action.to_string(), output.to_string());
        self
    }

    /// Make `action` fail, printing `output`.
    #[must_use]
    pub fn fail_on(mut self, action: &str, output: &str) -> Self {
        self.failures.insert(action.to_string(), output.to_string());
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, DriverParams)> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(action, _)| action)
            .collect()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteExecutor for MockExecutor {
    async fn execute(
        &self,
        action: &str,
        params: &DriverParams,
    ) -> Result<String, ExecutionFailure> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((action.to_string(), params.clone()));
        if let Some(output) = self.failures.get(action) {
            return Err(scripted_failure(action, output));
        }
        Ok(self.outputs.get(action).cloned().unwrap_or_default())
    }
}

type AccessCall = (String, String, String);

pub struct MockAccessProvider {
    grant_failures: HashMap<String, String>,
    revoke_failures: HashMap<String, String>,
    grants: Mutex<Vec<AccessCall>>,
    revokes: Mutex<Vec<AccessCall>>,
}

impl MockAccessProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grant_failures: HashMap::new(),
            revoke_failures: HashMap::new(),
            grants: Mutex::new(Vec::new()),
            revokes: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn fail_grant_on(mut self, host: &str, output: &str) -> Self {
        self.grant_failures
            .insert(host.to_string(), output.to_string());
        self
    }

    #[must_use]
    pub fn fail_revoke_on(mut self, host: &str, output: &str) -> Self {
        self.revoke_failures
            .insert(host.to_string(), output.to_string());
        self
    }

    /// Every grant attempt as `(environment, host, export_id)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn grants(&self) -> Vec<AccessCall> {
        self.grants.lock().expect("lock poisoned").clone()
    }

    /// Every revoke attempt as `(environment, host, export_id)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn revokes(&self) -> Vec<AccessCall> {
        self.revokes.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockAccessProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessProvider for MockAccessProvider {
    async fn grant_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError> {
        self.grants.lock().expect("lock poisoned").push((
            environment.to_string(),
            host.to_string(),
            export_id.to_string(),
        ));
        match self.grant_failures.get(host) {
            Some(output) => Err(scripted_failure("grantaccess", output).into()),
            None => Ok(()),
        }
    }

    async fn revoke_access(
        &self,
        environment: &str,
        host: &str,
        export_id: &str,
    ) -> Result<(), ProviderError> {
        self.revokes.lock().expect("lock poisoned").push((
            environment.to_string(),
            host.to_string(),
            export_id.to_string(),
        ));
        match self.revoke_failures.get(host) {
            Some(output) => Err(scripted_failure("revokeaccess", output).into()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct MonitoringState {
    triggers: Mutex<HashMap<String, Vec<String>>>,
    failures: HashMap<String, String>,
    one_shot_failures: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    opened: Mutex<u32>,
    closed: Mutex<u32>,
}

impl MonitoringState {
    fn record(&self, operation: &str, host: &str) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push(format!("{operation} {host}"));
        let one_shot = self
            .one_shot_failures
            .lock()
            .expect("lock poisoned")
            .remove(operation);
        match one_shot.as_ref().or_else(|| self.failures.get(operation)) {
            Some(output) => Err(scripted_failure(operation, output).into()),
            None => Ok(()),
        }
    }
}

/// Monitoring provider whose sessions share one recorded state, so the
/// calls can be inspected after a session has been handed off and closed.
pub struct MockMonitoringProvider {
    state: Arc<MonitoringState>,
    open_failure: Option<String>,
}

impl MockMonitoringProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MonitoringState::default()),
            open_failure: None,
        }
    }

    /// # Panics
    ///
    /// Panics if called after a session has been opened.
    #[must_use]
    pub fn with_triggers(self, host: &str, triggers: &[&str]) -> Self {
        self.state.triggers.lock().expect("lock poisoned").insert(
            host.to_string(),
            triggers.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Make every session call named `operation` (e.g. `close`) fail.
    ///
    /// # Panics
    ///
    /// Panics if called after a session has been opened.
    #[must_use]
    pub fn fail_on(mut self, operation: &str, output: &str) -> Self {
        Arc::get_mut(&mut self.state)
            .expect("configure before opening sessions")
            .failures
            .insert(operation.to_string(), output.to_string());
        self
    }

    /// Make only the next session call named `operation` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn fail_once_on(self, operation: &str, output: &str) -> Self {
        self.state
            .one_shot_failures
            .lock()
            .expect("lock poisoned")
            .insert(operation.to_string(), output.to_string());
        self
    }

    #[must_use]
    pub fn fail_open(mut self, output: &str) -> Self {
        self.open_failure = Some(output.to_string());
        self
    }

    /// Triggers currently defined for `host`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn triggers(&self, host: &str) -> Vec<String> {
        self.state
            .triggers
            .lock()
            .expect("lock poisoned")
            .get(host)
            .cloned()
            .unwrap_or_default()
    }

    /// Session calls as `"<operation> <host>"`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().expect("lock poisoned").clone()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sessions_opened(&self) -> u32 {
        *self.state.opened.lock().expect("lock poisoned")
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sessions_closed(&self) -> u32 {
        *self.state.closed.lock().expect("lock poisoned")
    }
}

impl Default for MockMonitoringProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitoringProvider for MockMonitoringProvider {
    async fn open_session(
        &self,
        _environment: &str,
    ) -> Result<Box<dyn MonitoringSession>, ProviderError> {
        if let Some(output) = &self.open_failure {
            return Err(scripted_failure("monitoringlogin", output).into());
        }
        *self.state.opened.lock().expect("lock poisoned") += 1;
        Ok(Box::new(MockMonitoringSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockMonitoringSession {
    state: Arc<MonitoringState>,
}

#[async_trait]
impl MonitoringSession for MockMonitoringSession {
    async fn host_triggers(&self, host: &str) -> Result<Vec<String>, ProviderError> {
        self.state.record("host_triggers", host)?;
        Ok(self
            .state
            .triggers
            .lock()
            .expect("lock poisoned")
            .get(host)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_instance_monitors(&self, host: &str) -> Result<(), ProviderError> {
        self.state.record("delete_instance_monitors", host)?;
        self.state
            .triggers
            .lock()
            .expect("lock poisoned")
            .remove(host);
        Ok(())
    }

    async fn create_basic_monitors(&self, instance: &Instance) -> Result<(), ProviderError> {
        self.state
            .record("create_basic_monitors", &instance.hostname)?;
        self.state
            .triggers
            .lock()
            .expect("lock poisoned")
            .entry(instance.hostname.clone())
            .or_default()
            .push("basic".to_string());
        Ok(())
    }

    async fn create_instance_monitors(&self, instance: &Instance) -> Result<(), ProviderError> {
        self.state
            .record("create_instance_monitors", &instance.hostname)?;
        self.state
            .triggers
            .lock()
            .expect("lock poisoned")
            .entry(instance.hostname.clone())
            .or_default()
            .push("instance".to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), ProviderError> {
        *self.state.closed.lock().expect("lock poisoned") += 1;
        match self.state.failures.get("close") {
            Some(output) => Err(scripted_failure("monitoringlogout", output).into()),
            None => Ok(()),
        }
    }
}
