//! Reversible step sequences with compensating rollback.
//!
//! A sequence is an ordered list of steps that each know how to do and undo
//! one piece of work against a shared, mutable run context. Steps run in
//! order; the first failure stops forward progress and every step that ran,
//! including the failing one, is undone in reverse order. Failures from
//! either direction are captured at the step boundary into the context's
//! [`ErrorLog`] instead of propagating, so a run always completes and
//! reports one of three terminal states.
//!
//! ```
//! use async_trait::async_trait;
//! use dbaas_saga::{ErrorLog, RunContext, SequenceBuilder, StepFailure, WorkflowStep};
//!
//! #[derive(Default)]
//! struct Counter {
//!     value: u32,
//!     errors: ErrorLog,
//! }
//!
//! impl RunContext for Counter {
//!     fn errors(&self) -> &ErrorLog { &self.errors }
//!     fn errors_mut(&mut self) -> &mut ErrorLog { &mut self.errors }
//! }
//!
//! struct Increment;
//!
//! #[async_trait]
//! impl WorkflowStep for Increment {
//!     type Context = Counter;
//!
//!     fn name(&self) -> &'static str { "increment" }
//!
//!     async fn execute(&self, ctx: &mut Counter) -> Result<(), StepFailure> {
//!         ctx.value += 1;
//!         Ok(())
//!     }
//!
//!     async fn compensate(&self, ctx: &mut Counter) -> Result<(), StepFailure> {
//!         ctx.value -= 1;
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
//! let sequence = SequenceBuilder::new("count")
//!     .first_step(Increment)
//!     .then(Increment)
//!     .build();
//!
//! let mut ctx = Counter::default();
//! let report = sequence.run(&mut ctx).await;
//!
//! assert!(report.is_success());
//! assert_eq!(ctx.value, 2);
//! # });
//! ```

mod audit;
mod builder;
mod cancel;
mod context;
mod erased;
mod error;
mod sequence;
mod step;

pub use audit::{RunAuditLog, StepRecord, StepStatus};
pub use builder::{Empty, HasSteps, SequenceBuilder};
pub use cancel::CancellationToken;
pub use context::RunContext;
pub use error::{ErrorCode, ErrorLog, ErrorRecord, StepFailure, StepPhase};
pub use sequence::{FailedStep, RunOptions, RunReport, RunState, StepInfo, StepSequence};
pub use step::{Outcome, WorkflowStep};
