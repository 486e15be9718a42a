use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audit::{RunAuditLog, StepStatus};
use crate::cancel::CancellationToken;
use crate::context::RunContext;
use crate::erased::ErasedStep;
use crate::error::{ErrorCode, StepFailure, StepPhase};

/// Caller-supplied limits for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    step_timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl RunOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time budget for each `do` and `undo`, unless the step sets its own.
    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running(usize),
    RollingBack(usize),
    /// Every step succeeded.
    Succeeded,
    /// A step failed and every compensation succeeded.
    RolledBack,
    /// A step failed and at least one compensation failed too; manual
    /// cleanup may be needed.
    RollbackPartial,
    /// The run was abandoned before its first step, so nothing ran and
    /// nothing needed compensating.
    NotStarted,
}

impl RunState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::RolledBack | Self::RollbackPartial | Self::NotStarted
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Running(index) => write!(f, "running step {index}"),
            Self::RollingBack(index) => write!(f, "rolling back step {index}"),
            Self::Succeeded => f.write_str("succeeded"),
            Self::RolledBack => f.write_str("rolled back"),
            Self::RollbackPartial => f.write_str("partially rolled back"),
            Self::NotStarted => f.write_str("not started"),
        }
    }
}

/// Name and description of a step, without the step itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub index: usize,
    pub name: &'static str,
    pub description: String,
}

/// The step whose failure (or cancellation) triggered rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub index: usize,
    pub name: &'static str,
    pub description: String,
    /// Classification of the triggering failure.
    pub code: ErrorCode,
}

/// Outcome of a whole run. The failures themselves live in the context's
/// error log.
#[derive(Debug)]
pub struct RunReport {
    pub sequence: String,
    pub state: RunState,
    pub failed_step: Option<FailedStep>,
    pub audit: RunAuditLog,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == RunState::Succeeded
    }
}

/// An ordered, non-empty list of steps that runs with compensating rollback.
///
/// Steps run one after another. The first failure stops forward progress;
/// then every step whose `do` ran, the failing one included, is undone
/// exactly once, newest first. A failing undo is recorded and the remaining
/// undos still run.
pub struct StepSequence<Ctx> {
    name: String,
    steps: Vec<Box<dyn ErasedStep<Ctx>>>,
}

impl<Ctx: RunContext> StepSequence<Ctx> {
    pub(crate) fn from_steps(name: String, steps: Vec<Box<dyn ErasedStep<Ctx>>>) -> Self {
        Self { name, steps }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn steps(&self) -> Vec<StepInfo> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepInfo {
                index,
                name: step.name(),
                description: step.description(),
            })
            .collect()
    }

    /// Run with no timeout and no cancellation.
    pub async fn run(&self, ctx: &mut Ctx) -> RunReport {
        self.run_with(ctx, &RunOptions::default()).await
    }

    /// Run the sequence against `ctx`.
    ///
    /// Never fails: everything that went wrong is in `ctx.errors()` in the
    /// order it happened, and the report says how far the run got.
    pub async fn run_with(&self, ctx: &mut Ctx, options: &RunOptions) -> RunReport {
        let mut audit = RunAuditLog::new();
        let mut completed: Vec<usize> = Vec::with_capacity(self.steps.len());
        let mut failed_step = None;

        info!(sequence = %self.name, steps = self.steps.len(), "starting run");

        for (index, step) in self.steps.iter().enumerate() {
            if let Some(reason) = options.cancellation().reason() {
                let failure = StepFailure::new(
                    ErrorCode::Cancelled,
                    format!("run cancelled before step started: {reason}"),
                );
                warn!(step = step.name(), index, reason, "run cancelled");
                ctx.errors_mut()
                    .push(failure.into_record(index, step.name(), StepPhase::Execute));
                audit.record_cancelled(index, step.name(), step.description());
                failed_step = Some(Self::failed_step(step.as_ref(), index, ErrorCode::Cancelled));
                break;
            }

            let state = RunState::Running(index);
            debug!(?state, step = step.name(), "{}", step.description());
            audit.record_start(index, step.name(), step.description());

            let outcome = step
                .execute_erased(ctx, index, options.step_timeout())
                .await;
            completed.push(index);

            let status = if outcome.is_success() {
                StepStatus::Executed
            } else {
                StepStatus::Failed
            };
            audit.record_finished(status, step.compensation_description());
            if !outcome.is_success() {
                let code = ctx
                    .errors()
                    .last()
                    .map_or(ErrorCode::Unclassified, |record| record.code.clone());
                failed_step = Some(Self::failed_step(step.as_ref(), index, code));
                break;
            }
        }

        let Some(failed_step) = failed_step else {
            let state = RunState::Succeeded;
            info!(sequence = %self.name, ?state, "run finished");
            return RunReport {
                sequence: self.name.clone(),
                state,
                failed_step: None,
                audit,
            };
        };

        let undo_failures = self.compensate(ctx, &completed, options, &mut audit).await;
        let state = if undo_failures == 0 {
            RunState::RolledBack
        } else {
            RunState::RollbackPartial
        };

        info!(
            sequence = %self.name,
            ?state,
            failed_step = failed_step.name,
            undo_failures,
            errors = ctx.errors().len(),
            "run finished"
        );

        RunReport {
            sequence: self.name.clone(),
            state,
            failed_step: Some(failed_step),
            audit,
        }
    }

    async fn compensate(
        &self,
        ctx: &mut Ctx,
        completed: &[usize],
        options: &RunOptions,
        audit: &mut RunAuditLog,
    ) -> usize {
        let mut failures = 0;

        for &index in completed.iter().rev() {
            let step = &self.steps[index];
            let state = RunState::RollingBack(index);
            debug!(?state, step = step.name(), "{}", step.compensation_description());

            let outcome = step
                .compensate_erased(ctx, index, options.step_timeout())
                .await;
            if outcome.is_success() {
                audit.record_compensated(index);
            } else {
                failures += 1;
                audit.record_compensation_failed(index);
            }
        }

        failures
    }

    fn failed_step(step: &dyn ErasedStep<Ctx>, index: usize, code: ErrorCode) -> FailedStep {
        FailedStep {
            index,
            name: step.name(),
            description: step.description(),
            code,
        }
    }
}
