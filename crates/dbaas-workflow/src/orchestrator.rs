use std::sync::Arc;
use std::time::Duration;

use dbaas_saga::{
    CancellationToken, ErrorCode, ErrorLog, FailedStep, RunAuditLog, RunContext, RunOptions,
    RunState, StepPhase,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::ProvisionContext;
use crate::error::ConfigurationError;
use crate::traits::{AccessProvider, MonitoringProvider, RemoteExecutor};
use crate::types::{CredentialSpec, DatabaseSpec, HostExport, Instance};
use crate::workflows::WorkflowKind;

const OPEN_MONITORING: &str = "open_monitoring_session";
const CLOSE_MONITORING: &str = "close_monitoring_session";

/// Caller input for one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowParams {
    pub instance: Instance,
    pub database: Option<DatabaseSpec>,
    pub credential: Option<CredentialSpec>,
    pub bindings: Vec<HostExport>,
}

impl WorkflowParams {
    #[must_use]
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            database: None,
            credential: None,
            bindings: Vec::new(),
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

    /// Check that the params describe a runnable `kind` workflow.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self, kind: WorkflowKind) -> Result<(), ConfigurationError> {
        let instance = &self.instance;
        for (field, value) in [
            ("environment", &instance.environment),
            ("hostname", &instance.hostname),
            ("dns", &instance.dns),
            ("address", &instance.address),
            ("user", &instance.user),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::EmptyField { field });
            }
        }
        if instance.port == 0 {
            return Err(ConfigurationError::InvalidPort);
        }

        match kind {
            WorkflowKind::Provision => {
                if self.database.is_none() {
                    return Err(ConfigurationError::MissingDatabase {
                        workflow: kind.name(),
                    });
                }
                if self.credential.is_none() {
                    return Err(ConfigurationError::MissingCredential {
                        workflow: kind.name(),
                    });
                }
            }
            WorkflowKind::RestoreSnapshot => {
                if self.bindings.is_empty() {
                    return Err(ConfigurationError::NoBindings {
                        workflow: kind.name(),
                    });
                }
            }
            WorkflowKind::RebuildAlarms => {}
        }
        Ok(())
    }
}

/// What the caller gets back from a run.
///
/// `state` is [`RunState::NotStarted`] when the run was abandoned before its
/// first step, e.g. because no monitoring session could be opened. `audit`
/// is `None` in that case.
#[derive(Debug, Serialize)]
pub struct WorkflowResult {
    pub workflow: WorkflowKind,
    pub success: bool,
    pub state: RunState,
    pub failed_step: Option<FailedStep>,
    /// Every failure of the run, oldest first.
    pub errors: ErrorLog,
    #[serde(skip)]
    pub audit: Option<RunAuditLog>,
}

/// Entry point binding named workflows to their step sequences.
///
/// Holds only collaborators and settings; every run gets its own context,
/// so one orchestrator can serve concurrent runs.
pub struct Orchestrator<E, A, M> {
    executor: Arc<E>,
    access: Arc<A>,
    monitoring: Arc<M>,
    step_timeout: Option<Duration>,
}

impl<E, A, M> Orchestrator<E, A, M>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
    M: MonitoringProvider,
{
    pub fn new(executor: Arc<E>, access: Arc<A>, monitoring: Arc<M>) -> Self {
        Self {
            executor,
            access,
            monitoring,
            step_timeout: None,
        }
    }

    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Run `kind` against `params`.
    ///
    /// Every workflow manages alarms, so a monitoring session is opened
    /// before the first step and closed after the last step or compensation,
    /// whatever the outcome. Failing to close is logged and recorded but does
    /// not change whether the run succeeded.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `params` cannot describe a `kind`
    /// run. Nothing is executed in that case. Failures during the run are
    /// reported in the result instead.
    pub async fn run(
        &self,
        kind: WorkflowKind,
        params: WorkflowParams,
        cancellation: CancellationToken,
    ) -> Result<WorkflowResult, ConfigurationError> {
        params.validate(kind)?;

        let mut ctx = self.context(params);
        let sequence = kind.sequence::<E, A>();
        let mut options = RunOptions::new().with_cancellation(cancellation);
        if let Some(timeout) = self.step_timeout {
            options = options.with_step_timeout(timeout);
        }

        info!(workflow = %kind, host = %ctx.instance().hostname, "starting workflow");

        let environment = ctx.instance().environment.clone();
        match self.monitoring.open_session(&environment).await {
            Ok(session) => ctx.attach_monitoring(session),
            Err(error) => {
                warn!(workflow = %kind, %error, "could not open monitoring session");
                ctx.errors_mut().push(
                    error
                        .into_step_failure(ErrorCode::Unclassified)
                        .into_record(0, OPEN_MONITORING, StepPhase::Execute),
                );
                return Ok(WorkflowResult {
                    workflow: kind,
                    success: false,
                    state: RunState::NotStarted,
                    failed_step: None,
                    errors: ctx.into_errors(),
                    audit: None,
                });
            }
        }

        let report = sequence.run_with(&mut ctx, &options).await;

        if let Some(session) = ctx.take_monitoring() {
            if let Err(error) = session.close().await {
                warn!(workflow = %kind, %error, "could not close monitoring session");
                ctx.errors_mut().push(
                    error
                        .into_step_failure(ErrorCode::Unclassified)
                        .into_record(sequence.len(), CLOSE_MONITORING, StepPhase::Compensate),
                );
            }
        }

        info!(
            workflow = %kind,
            success = report.is_success(),
            state = ?report.state,
            errors = ctx.errors().len(),
            "workflow finished"
        );

        Ok(WorkflowResult {
            workflow: kind,
            success: report.is_success(),
            state: report.state,
            failed_step: report.failed_step,
            errors: ctx.into_errors(),
            audit: Some(report.audit),
        })
    }

    fn context(&self, params: WorkflowParams) -> ProvisionContext<E, A> {
        let mut ctx = ProvisionContext::new(
            params.instance,
            Arc::clone(&self.executor),
            Arc::clone(&self.access),
        )
        .with_bindings(params.bindings);
        if let Some(database) = params.database {
            ctx = ctx.with_database(database);
        }
        if let Some(credential) = params.credential {
            ctx = ctx.with_credential(credential);
        }
        ctx
    }
}
