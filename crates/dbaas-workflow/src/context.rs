use std::sync::Arc;

use dbaas_saga::{ErrorLog, RunContext};

use crate::traits::{AccessProvider, MonitoringSession, RemoteExecutor};
use crate::types::{CredentialSpec, DatabaseSpec, HostExport, Instance, ResourceState};

/// Shared state of one provisioning run.
///
/// Inputs come from the caller; everything else is written by steps as
/// they go and read back by later steps and by compensations.
pub struct ProvisionContext<E, A> {
    pub(crate) instance: Instance,
    pub(crate) database: Option<DatabaseSpec>,
    pub(crate) credential: Option<CredentialSpec>,
    pub(crate) bindings: Vec<HostExport>,
    pub(crate) granted: Vec<HostExport>,
    pub(crate) database_state: Option<ResourceState>,
    pub(crate) credential_state: Option<ResourceState>,
    pub(crate) removed_monitors: Vec<String>,
    pub(crate) replaced_monitors: Vec<String>,
    pub(crate) monitoring: Option<Box<dyn MonitoringSession>>,
    pub(crate) executor: Arc<E>,
    pub(crate) access: Arc<A>,
    errors: ErrorLog,
}

impl<E, A> ProvisionContext<E, A>
where
    E: RemoteExecutor,
    A: AccessProvider,
{
    pub fn new(instance: Instance, executor: Arc<E>, access: Arc<A>) -> Self {
        Self {
            instance,
            database: None,
            credential: None,
            bindings: Vec::new(),
            granted: Vec::new(),
            database_state: None,
            credential_state: None,
            removed_monitors: Vec::new(),
            replaced_monitors: Vec::new(),
            monitoring: None,
            executor,
            access,
            errors: ErrorLog::new(),
        }
    }

    #[must_use]
    pub fn with_database(mut self, database: DatabaseSpec) -> Self {
        self.database = Some(database);
        self
    }

    #[must_use]
    pub fn with_credential(mut self, credential: CredentialSpec) -> Self {
        self.credential = Some(credential);
        self
    }

    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<HostExport>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Hand the run a monitoring session. The context never closes it;
    /// whoever opened it takes it back with [`Self::take_monitoring`].
    pub fn attach_monitoring(&mut self, session: Box<dyn MonitoringSession>) {
        self.monitoring = Some(session);
    }

    pub fn take_monitoring(&mut self) -> Option<Box<dyn MonitoringSession>> {
        self.monitoring.take()
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[must_use]
    pub fn database(&self) -> Option<&DatabaseSpec> {
        self.database.as_ref()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&CredentialSpec> {
        self.credential.as_ref()
    }

    #[must_use]
    pub fn bindings(&self) -> &[HostExport] {
        &self.bindings
    }

    /// Bindings that currently hold an access grant made by this run.
    #[must_use]
    pub fn granted(&self) -> &[HostExport] {
        &self.granted
    }

    #[must_use]
    pub fn database_state(&self) -> Option<ResourceState> {
        self.database_state
    }

    #[must_use]
    pub fn credential_state(&self) -> Option<ResourceState> {
        self.credential_state
    }

    /// Hosts whose monitors were deleted by this run and not yet recreated.
    #[must_use]
    pub fn removed_monitors(&self) -> &[String] {
        &self.removed_monitors
    }

    /// Hosts whose monitors existed before alarm creation replaced them.
    #[must_use]
    pub fn replaced_monitors(&self) -> &[String] {
        &self.replaced_monitors
    }

    #[must_use]
    pub fn has_monitoring(&self) -> bool {
        self.monitoring.is_some()
    }

    #[must_use]
    pub fn into_errors(self) -> ErrorLog {
        self.errors
    }
}

impl<E, A> RunContext for ProvisionContext<E, A>
where
    E: RemoteExecutor,
    A: AccessProvider,
{
    fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }
}
