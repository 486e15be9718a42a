use std::marker::PhantomData;

use async_trait::async_trait;
use dbaas_saga::{StepFailure, WorkflowStep};
use tracing::{debug, warn};

use super::tolerate_not_found;
use crate::context::ProvisionContext;
use crate::error::NFS_ACCESS_CODE;
use crate::traits::{AccessProvider, RemoteExecutor};

/// Grants every bound host access to its export.
///
/// Each successful grant is recorded in the context before the next one is
/// attempted, so a failure half way leaves an exact list for the undo.
pub struct GrantNfsAccess<E, A> {
    _marker: PhantomData<(E, A)>,
}

impl<E, A> GrantNfsAccess<E, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, A> Default for GrantNfsAccess<E, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E, A> WorkflowStep for GrantNfsAccess<E, A>
where
    E: RemoteExecutor + 'static,
    A: AccessProvider + 'static,
{
    type Context = ProvisionContext<E, A>;

    fn name(&self) -> &'static str {
        "grant_nfs_access"
    }

    fn description(&self) -> String {
        "Granting nfs access...".to_string()
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let environment = ctx.instance.environment.clone();
        for binding in ctx.bindings.clone() {
            if ctx.granted.contains(&binding) {
                continue;
            }
            ctx.access
                .grant_access(&environment, &binding.host, &binding.export_id)
                .await
                .map_err(|error| error.into_step_failure(NFS_ACCESS_CODE))?;
            debug!(
                host = %binding.host,
                export = %binding.export_id,
                "granted nfs access"
            );
            ctx.granted.push(binding);
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let environment = ctx.instance.environment.clone();
        let mut first_failure = None;

        for binding in std::mem::take(&mut ctx.granted).into_iter().rev() {
            let revoked = tolerate_not_found(
                ctx.access
                    .revoke_access(&environment, &binding.host, &binding.export_id)
                    .await,
            );
            match revoked {
                Ok(()) => debug!(
                    host = %binding.host,
                    export = %binding.export_id,
                    "revoked nfs access"
                ),
                Err(error) => {
                    warn!(
                        host = %binding.host,
                        export = %binding.export_id,
                        %error,
                        "failed to revoke nfs access"
                    );
                    ctx.granted.insert(0, binding);
                    first_failure.get_or_insert(error);
                }
            }
        }

        match first_failure {
            Some(error) => Err(error.into_step_failure(NFS_ACCESS_CODE)),
            None => Ok(()),
        }
    }

    fn compensation_description(&self) -> String {
        "revoke nfs access granted by this run".to_string()
    }
}
