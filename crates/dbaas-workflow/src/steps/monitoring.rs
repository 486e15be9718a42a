use std::marker::PhantomData;

use async_trait::async_trait;
use dbaas_saga::{ErrorCode, StepFailure, WorkflowStep};
use tracing::debug;

use super::tolerate_not_found;
use crate::context::ProvisionContext;
use crate::error::ProviderError;
use crate::traits::{AccessProvider, MonitoringSession, RemoteExecutor};
use crate::types::Instance;

fn session(
    monitoring: Option<&dyn MonitoringSession>,
) -> Result<&dyn MonitoringSession, StepFailure> {
    monitoring.ok_or_else(|| {
        StepFailure::new(
            ErrorCode::Unclassified,
            "no monitoring session is open for this run",
        )
    })
}

/// Delete the monitors of the instance's hostname and DNS name, where any
/// exist. Each host is pushed to `removed` as soon as its monitors are gone,
/// so a failure half way still leaves an exact list.
async fn destroy_monitors(
    session: &dyn MonitoringSession,
    instance: &Instance,
    removed: &mut Vec<String>,
) -> Result<(), ProviderError> {
    for host in [&instance.hostname, &instance.dns] {
        let triggers = session.host_triggers(host).await?;
        if triggers.is_empty() {
            continue;
        }
        session.delete_instance_monitors(host).await?;
        debug!(host = %host, triggers = triggers.len(), "deleted monitors");
        if !removed.contains(host) {
            removed.push(host.clone());
        }
    }
    Ok(())
}

async fn create_monitors(
    session: &dyn MonitoringSession,
    instance: &Instance,
) -> Result<(), ProviderError> {
    session.create_basic_monitors(instance).await?;
    session.create_instance_monitors(instance).await?;
    debug!(host = %instance.hostname, "created monitors");
    Ok(())
}

/// Removes the instance's existing alarms.
pub struct DestroyAlarms<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> DestroyAlarms<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for DestroyAlarms<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for DestroyAlarms<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "destroy_alarms"
    }

    fn description(&self) -> String {
        "Destroying monitoring alarms...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let session = session(ctx.monitoring.as_deref())?;
        destroy_monitors(session, &ctx.instance, &mut ctx.removed_monitors)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        if ctx.removed_monitors.is_empty() {
            debug!("no monitors were removed, nothing to recreate");
            return Ok(());
        }
        create_monitors(session(ctx.monitoring.as_deref())?, &ctx.instance)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;
        ctx.removed_monitors.clear();
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "recreate the alarms that were destroyed".to_string()
    }
}

/// Replaces the instance's alarms with a fresh set.
pub struct CreateAlarms<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> CreateAlarms<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for CreateAlarms<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for CreateAlarms<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "create_alarms"
    }

    fn description(&self) -> String {
        "Creating monitoring alarms...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let session = session(ctx.monitoring.as_deref())?;
        destroy_monitors(session, &ctx.instance, &mut ctx.replaced_monitors)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;
        create_monitors(session, &ctx.instance)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let session = session(ctx.monitoring.as_deref())?;
        let mut created = Vec::new();
        tolerate_not_found(destroy_monitors(session, &ctx.instance, &mut created).await)
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;

        if ctx.replaced_monitors.is_empty() {
            return Ok(());
        }
        create_monitors(session, &ctx.instance)
            .await
            .map_err(|error| error.into_step_failure(ErrorCode::Unclassified))?;
        debug!(hosts = ?ctx.replaced_monitors, "restored monitors that existed before the run");
        ctx.replaced_monitors.clear();
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "destroy the alarms created by this run and restore the previous ones".to_string()
    }
}
