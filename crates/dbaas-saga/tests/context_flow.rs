//! Integration tests for data flowing between steps through the shared context.

use async_trait::async_trait;
use dbaas_saga::{ErrorCode, ErrorLog, RunContext, SequenceBuilder, StepFailure, WorkflowStep};

#[derive(Default)]
struct InventoryContext {
    requested: Vec<&'static str>,
    granted: Vec<&'static str>,
    resolved_address: Option<String>,
    errors: ErrorLog,
}

impl RunContext for InventoryContext {
    fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }
}

struct ResolveAddress;

#[async_trait]
impl WorkflowStep for ResolveAddress {
    type Context = InventoryContext;

    fn name(&self) -> &'static str {
        "resolve_address"
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.resolved_address = Some("10.0.0.7:27017".to_string());
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.resolved_address = None;
        Ok(())
    }
}

/// Grants every requested item until it hits `fail_on`, recording each
/// grant as it goes.
struct GrantEach {
    fail_on: Option<&'static str>,
}

#[async_trait]
impl WorkflowStep for GrantEach {
    type Context = InventoryContext;

    fn name(&self) -> &'static str {
        "grant_each"
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        if ctx.resolved_address.is_none() {
            return Err(StepFailure::new(ErrorCode::NotFound, "no address resolved"));
        }
        for item in ctx.requested.clone() {
            if Some(item) == self.fail_on {
                return Err(StepFailure::new(
                    ErrorCode::domain("GRANT_FAILED"),
                    format!("could not grant {item}"),
                ));
            }
            ctx.granted.push(item);
        }
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        ctx.granted.clear();
        Ok(())
    }
}

struct Inspect {
    seen: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl WorkflowStep for Inspect {
    type Context = InventoryContext;

    fn name(&self) -> &'static str {
        "inspect"
    }

    async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
        self.seen
            .lock()
            .expect("lock")
            .extend(ctx.granted.iter().copied());
        Ok(())
    }
}

#[tokio::test]
async fn later_steps_see_what_earlier_steps_wrote() {
    let seen = std::sync::Arc::default();
    let mut ctx = InventoryContext {
        requested: vec!["host-a", "host-b"],
        ..InventoryContext::default()
    };
    let sequence = SequenceBuilder::new("flow")
        .first_step(ResolveAddress)
        .then(GrantEach { fail_on: None })
        .then(Inspect {
            seen: std::sync::Arc::clone(&seen),
        })
        .build();

    let report = sequence.run(&mut ctx).await;

    assert!(report.is_success());
    assert_eq!(ctx.granted, vec!["host-a", "host-b"]);
    assert_eq!(*seen.lock().expect("lock"), vec!["host-a", "host-b"]);
}

#[tokio::test]
async fn partial_writes_are_visible_to_undo_of_the_failing_step() {
    #[derive(Default)]
    struct Observed(std::sync::Mutex<Vec<&'static str>>);

    struct ObservingGrant {
        inner: GrantEach,
        observed: std::sync::Arc<Observed>,
    }

    #[async_trait]
    impl WorkflowStep for ObservingGrant {
        type Context = InventoryContext;

        fn name(&self) -> &'static str {
            self.inner.name()
        }

        async fn execute(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
            self.inner.execute(ctx).await
        }

        async fn compensate(&self, ctx: &mut Self::Context) -> Result<(), StepFailure> {
            self.observed
                .0
                .lock()
                .expect("lock")
                .extend(ctx.granted.iter().copied());
            self.inner.compensate(ctx).await
        }
    }

    let observed = std::sync::Arc::new(Observed::default());
    let mut ctx = InventoryContext {
        requested: vec!["host-a", "host-b", "host-c"],
        ..InventoryContext::default()
    };
    let sequence = SequenceBuilder::new("partial_flow")
        .first_step(ResolveAddress)
        .then(ObservingGrant {
            inner: GrantEach {
                fail_on: Some("host-c"),
            },
            observed: std::sync::Arc::clone(&observed),
        })
        .build();

    let report = sequence.run(&mut ctx).await;

    assert!(!report.is_success());
    assert_eq!(*observed.0.lock().expect("lock"), vec!["host-a", "host-b"]);
    assert!(ctx.granted.is_empty());
    assert!(ctx.resolved_address.is_none());
    assert_eq!(
        ctx.errors.last().map(|r| r.message.as_str()),
        Some("could not grant host-c")
    );
}
