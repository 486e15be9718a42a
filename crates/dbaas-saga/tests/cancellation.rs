//! Integration tests for cooperative cancellation.

use async_trait::async_trait;
use dbaas_saga::{
    CancellationToken, ErrorCode, ErrorLog, RunContext, RunOptions, RunState, SequenceBuilder,
    StepFailure, StepStatus, WorkflowStep,
};

#[derive(Default)]
struct TestContext {
    calls: Vec<String>,
    errors: ErrorLog,
}

impl RunContext for TestContext {
    fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }
}

struct RecordingStep {
    name: &'static str,
}

#[async_trait]
impl WorkflowStep for RecordingStep {
    type Context = TestContext;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("do {}", self.name));
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("undo {}", self.name));
        Ok(())
    }
}

/// Cancels the run from inside a step, as a signal handler would while it runs.
struct CancelWhileRunning {
    token: CancellationToken,
}

#[async_trait]
impl WorkflowStep for CancelWhileRunning {
    type Context = TestContext;

    fn name(&self) -> &'static str {
        "cancel_while_running"
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push("do cancel_while_running".to_string());
        self.token.cancel("interrupted by operator");
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push("undo cancel_while_running".to_string());
        Ok(())
    }
}

#[tokio::test]
async fn in_flight_step_finishes_and_next_step_is_treated_as_failed() {
    let token = CancellationToken::new();
    let options = RunOptions::new().with_cancellation(token.clone());
    let mut ctx = TestContext::default();
    let sequence = SequenceBuilder::new("cancel_mid_run")
        .first_step(RecordingStep { name: "a" })
        .then(CancelWhileRunning { token })
        .then(RecordingStep { name: "c" })
        .build();

    let report = sequence.run_with(&mut ctx, &options).await;

    assert_eq!(report.state, RunState::RolledBack);
    assert_eq!(
        ctx.calls,
        vec![
            "do a",
            "do cancel_while_running",
            "undo cancel_while_running",
            "undo a"
        ]
    );

    let failed = report.failed_step.expect("cancelled step should be reported");
    assert_eq!(failed.index, 2);
    assert_eq!(failed.code, ErrorCode::Cancelled);

    let record = ctx.errors.last().expect("cancellation should be recorded");
    assert_eq!(record.step, "c");
    assert!(record.message.contains("interrupted by operator"));

    assert_eq!(
        report.audit.record(2).map(|r| r.status),
        Some(StepStatus::Cancelled)
    );
}

#[tokio::test]
async fn untouched_token_does_not_affect_the_run() {
    let options = RunOptions::new().with_cancellation(CancellationToken::new());
    let mut ctx = TestContext::default();
    let sequence = SequenceBuilder::new("not_cancelled")
        .first_step(RecordingStep { name: "a" })
        .then(RecordingStep { name: "b" })
        .build();

    let report = sequence.run_with(&mut ctx, &options).await;

    assert!(report.is_success());
    assert!(ctx.errors.is_empty());
}
