use std::sync::Arc;
use std::time::Duration;

use dbaas_saga::CancellationToken;
use dbaas_workflow::providers::{ScriptAccessProvider, ScriptExecutor, ScriptMonitoringProvider};
use dbaas_workflow::{Orchestrator, RunFile};
use tokio::task::JoinHandle;
use tracing::warn;

use super::{Outcome, RunArgs};
use crate::error::Result;

pub(crate) async fn run(args: RunArgs) -> Result<Outcome> {
    let mut run_file = RunFile::load(&args.config)?;
    if let Some(seconds) = args.timeout {
        run_file = run_file.with_step_timeout(Duration::from_secs(seconds));
    }

    let executor = Arc::new(ScriptExecutor::new(run_file.engine().script()));
    let mut orchestrator = Orchestrator::new(
        Arc::clone(&executor),
        Arc::new(ScriptAccessProvider::new(Arc::clone(&executor))),
        Arc::new(ScriptMonitoringProvider::new(executor)),
    );
    if let Some(timeout) = run_file.engine().step_timeout() {
        orchestrator = orchestrator.with_step_timeout(timeout);
    }

    let cancellation = CancellationToken::new();
    let interrupt = cancel_on_interrupt(cancellation.clone());
    let result = orchestrator
        .run(args.workflow, run_file.into_params(), cancellation)
        .await;
    interrupt.abort();
    let result = result?;

    print!("{}", args.format.formatter().format_result(&result)?);

    if result.success {
        Ok(Outcome::Success)
    } else {
        Ok(Outcome::WorkflowFailed)
    }
}

/// Cancel the run on Ctrl-C. The step in flight finishes, then the
/// completed steps are rolled back.
fn cancel_on_interrupt(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, rolling back after the current step");
            token.cancel("interrupted by user");
        }
    })
}
