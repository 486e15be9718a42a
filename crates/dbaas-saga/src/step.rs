use std::time::Duration;

use async_trait::async_trait;

use crate::context::RunContext;
use crate::error::StepFailure;

/// Result of one `do` or `undo` invocation as seen by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// A reversible unit of work in a sequence.
///
/// Steps read their inputs from the shared context and may add to it for
/// later steps. A failing step returns a classified [`StepFailure`]; the
/// executor records it in the context's error log and never lets it escape
/// the sequence.
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Shared run state this step operates on.
    type Context: RunContext;

    /// Stable name for logging and error records.
    fn name(&self) -> &'static str;

    /// Human-readable description for operator-facing output.
    fn description(&self) -> String {
        self.name().replace('_', " ")
    }

    /// Perform the forward action.
    ///
    /// Writes into the context should be additive so that `compensate` can
    /// rely on whatever was recorded even when this fails half way.
    ///
    /// # Errors
    ///
    /// Returns a classified failure if the underlying collaborator call fails.
    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure>;

    /// Undo the forward action.
    ///
    /// Called during rollback for every step whose `execute` ran, including
    /// the one that failed, so it must tolerate partial or missing effects.
    /// The default is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns a classified failure if compensation fails.
    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        let _ = ctx;
        Ok(())
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }

    /// Time budget overriding the run-wide step timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
