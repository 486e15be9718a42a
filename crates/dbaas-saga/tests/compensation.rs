//! Integration tests for forward execution and rollback ordering.

use async_trait::async_trait;
use dbaas_saga::{
    ErrorCode, ErrorLog, RunContext, RunState, SequenceBuilder, StepFailure, StepPhase,
    WorkflowStep,
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

impl TestContext {
    fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
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

struct FailingStep {
    name: &'static str,
    code: ErrorCode,
}

#[async_trait]
impl WorkflowStep for FailingStep {
    type Context = TestContext;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("do {}", self.name));
        Err(StepFailure::new(self.code.clone(), "couldn't connect to server"))
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("undo {}", self.name));
        Ok(())
    }
}

struct ScriptedStep {
    name: &'static str,
    fail: bool,
}

#[async_trait]
impl WorkflowStep for ScriptedStep {
    type Context = TestContext;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("do {}", self.name));
        if self.fail {
            return Err(StepFailure::new(ErrorCode::Unclassified, "scripted failure"));
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.calls.push(format!("undo {}", self.name));
        Ok(())
    }
}

fn recording(name: &'static str) -> RecordingStep {
    RecordingStep { name }
}

#[tokio::test]
async fn happy_path_runs_every_step_once_and_never_undoes() {
    let mut ctx = TestContext::default();
    let sequence = SequenceBuilder::new("happy")
        .first_step(recording("a"))
        .then(recording("b"))
        .then(recording("c"))
        .build();

    let report = sequence.run(&mut ctx).await;

    assert!(report.is_success());
    assert_eq!(report.state, RunState::Succeeded);
    assert_eq!(ctx.calls, vec!["do a", "do b", "do c"]);
    assert_eq!(ctx.count("undo"), 0);
    assert!(ctx.errors.is_empty());
}

fn step_at(index: usize, failing: usize) -> ScriptedStep {
    const NAMES: [&str; 4] = ["s0", "s1", "s2", "s3"];
    ScriptedStep {
        name: NAMES[index],
        fail: index == failing,
    }
}

#[tokio::test]
async fn failure_at_k_runs_k_plus_one_dos_and_undoes_in_descending_order() {
    for k in 0..4 {
        let sequence = SequenceBuilder::new("parametric")
            .first_step(step_at(0, k))
            .then(step_at(1, k))
            .then(step_at(2, k))
            .then(step_at(3, k))
            .build();
        let mut ctx = TestContext::default();

        let report = sequence.run(&mut ctx).await;

        assert_eq!(report.state, RunState::RolledBack, "k = {k}");
        assert_eq!(ctx.count("do"), k + 1, "k = {k}");
        assert_eq!(ctx.count("undo"), k + 1, "k = {k}");

        let undone: Vec<&str> = ctx
            .calls
            .iter()
            .filter_map(|c| c.strip_prefix("undo "))
            .collect();
        let expected: Vec<&str> = ["s0", "s1", "s2", "s3"][..=k].iter().rev().copied().collect();
        assert_eq!(undone, expected, "k = {k}");

        assert_eq!(ctx.errors.len(), 1, "k = {k}");
        let record = &ctx.errors.records()[0];
        assert_eq!(record.step_index, k);
        assert_eq!(record.phase, StepPhase::Execute);
        assert_eq!(record.code, ErrorCode::Unclassified);
    }
}

#[tokio::test]
async fn failing_third_step_is_undone_before_the_ones_that_preceded_it() {
    let mut ctx = TestContext::default();
    let sequence = SequenceBuilder::new("abc")
        .first_step(recording("a"))
        .then(recording("b"))
        .then(FailingStep {
            name: "c",
            code: ErrorCode::Connection,
        })
        .build();

    let report = sequence.run(&mut ctx).await;

    assert!(!report.is_success());
    assert_eq!(
        ctx.calls,
        vec!["do a", "do b", "do c", "undo c", "undo b", "undo a"]
    );
    assert_eq!(ctx.errors.codes(), vec![&ErrorCode::Connection]);

    let failed = report.failed_step.expect("failed step should be reported");
    assert_eq!(failed.name, "c");
    assert_eq!(failed.index, 2);
}

#[tokio::test]
async fn steps_after_the_failure_are_never_touched() {
    let mut ctx = TestContext::default();
    let sequence = SequenceBuilder::new("short_circuit")
        .first_step(FailingStep {
            name: "first",
            code: ErrorCode::Authentication,
        })
        .then(recording("second"))
        .then(recording("third"))
        .build();

    let report = sequence.run(&mut ctx).await;

    assert_eq!(report.state, RunState::RolledBack);
    assert_eq!(ctx.calls, vec!["do first", "undo first"]);
    assert_eq!(
        report.failed_step.map(|f| f.code),
        Some(ErrorCode::Authentication)
    );
}

#[tokio::test]
async fn a_sequence_can_be_run_again_with_a_fresh_context() {
    let sequence = SequenceBuilder::new("reusable")
        .first_step(recording("a"))
        .then(recording("b"))
        .build();

    let mut first = TestContext::default();
    let mut second = TestContext::default();
    let first_report = sequence.run(&mut first).await;
    let second_report = sequence.run(&mut second).await;

    assert!(first_report.is_success());
    assert!(second_report.is_success());
    assert_eq!(first.calls, second.calls);
}
