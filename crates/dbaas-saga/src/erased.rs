use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::warn;

use crate::context::RunContext;
use crate::error::{ErrorCode, StepFailure, StepPhase};
use crate::step::{Outcome, WorkflowStep};

/// Object-safe view of a step that also acts as its failure boundary.
///
/// Whatever happens inside the step (an error, a timeout or a panic) ends up
/// as a record in the context's error log and a `Failed` outcome.
#[async_trait]
pub(crate) trait ErasedStep<Ctx>: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    fn compensation_description(&self) -> String;

    async fn execute_erased(
        &self,
        ctx: &mut Ctx,
        index: usize,
        default_timeout: Option<Duration>,
    ) -> Outcome;

    async fn compensate_erased(
        &self,
        ctx: &mut Ctx,
        index: usize,
        default_timeout: Option<Duration>,
    ) -> Outcome;
}

pub(crate) struct StepWrapper<S> {
    step: S,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

#[async_trait]
impl<S> ErasedStep<S::Context> for StepWrapper<S>
where
    S: WorkflowStep,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    fn description(&self) -> String {
        self.step.description()
    }

    fn compensation_description(&self) -> String {
        self.step.compensation_description()
    }

    async fn execute_erased(
        &self,
        ctx: &mut S::Context,
        index: usize,
        default_timeout: Option<Duration>,
    ) -> Outcome {
        let limit = self.step.timeout().or(default_timeout);
        let result = guarded(self.step.execute(ctx), limit).await;
        settle(ctx, index, self.step.name(), StepPhase::Execute, result)
    }

    async fn compensate_erased(
        &self,
        ctx: &mut S::Context,
        index: usize,
        default_timeout: Option<Duration>,
    ) -> Outcome {
        let limit = self.step.timeout().or(default_timeout);
        let result = guarded(self.step.compensate(ctx), limit).await;
        settle(ctx, index, self.step.name(), StepPhase::Compensate, result)
    }
}

async fn guarded<F>(future: F, limit: Option<Duration>) -> Result<(), StepFailure>
where
    F: Future<Output = Result<(), StepFailure>> + Send,
{
    let caught = AssertUnwindSafe(future).catch_unwind();
    let joined = match limit {
        Some(limit) => match tokio::time::timeout(limit, caught).await {
            Ok(joined) => joined,
            Err(_) => {
                return Err(StepFailure::new(
                    ErrorCode::Timeout,
                    format!("did not finish within {limit:?}"),
                ));
            }
        },
        None => caught.await,
    };

    joined.unwrap_or_else(|payload| {
        Err(StepFailure::new(
            ErrorCode::Panicked,
            format!("panicked: {}", panic_message(payload.as_ref())),
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn settle<Ctx: RunContext>(
    ctx: &mut Ctx,
    index: usize,
    name: &'static str,
    phase: StepPhase,
    result: Result<(), StepFailure>,
) -> Outcome {
    match result {
        Ok(()) => Outcome::Succeeded,
        Err(failure) => {
            warn!(
                step = name,
                index,
                phase = %phase,
                code = %failure.code(),
                "{}",
                failure.message()
            );
            ctx.errors_mut().push(failure.into_record(index, name, phase));
            Outcome::Failed
        }
    }
}
