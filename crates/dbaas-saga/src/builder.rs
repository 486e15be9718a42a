use std::marker::PhantomData;

use crate::context::RunContext;
use crate::erased::{ErasedStep, StepWrapper};
use crate::sequence::StepSequence;
use crate::step::WorkflowStep;

/// Marker type for a builder with no steps.
pub struct Empty;

/// Marker type for a builder with at least one step.
pub struct HasSteps;

/// Type-state builder for step sequences.
///
/// Every step must operate on the same context type, and a sequence cannot
/// be built without at least one step:
///
/// ```compile_fail
/// use dbaas_saga::{ErrorLog, RunContext, SequenceBuilder};
///
/// struct Ctx(ErrorLog);
///
/// impl RunContext for Ctx {
///     fn errors(&self) -> &ErrorLog { &self.0 }
///     fn errors_mut(&mut self) -> &mut ErrorLog { &mut self.0 }
/// }
///
/// // `build()` is only available after `first_step()`
/// let sequence = SequenceBuilder::<Ctx, _>::new("empty").build();
/// ```
pub struct SequenceBuilder<Ctx, State> {
    name: String,
    steps: Vec<Box<dyn ErasedStep<Ctx>>>,
    _state: PhantomData<State>,
}

impl<Ctx: RunContext> SequenceBuilder<Ctx, Empty> {
    /// Create a new builder in the empty state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Add the first step to the sequence.
    #[must_use]
    pub fn first_step<S>(self, step: S) -> SequenceBuilder<Ctx, HasSteps>
    where
        S: WorkflowStep<Context = Ctx> + 'static,
    {
        let mut steps = self.steps;
        steps.push(Box::new(StepWrapper::new(step)));
        SequenceBuilder {
            name: self.name,
            steps,
            _state: PhantomData,
        }
    }
}

impl<Ctx: RunContext> SequenceBuilder<Ctx, HasSteps> {
    /// Append a step; it runs after every step added before it.
    #[must_use]
    pub fn then<S>(mut self, step: S) -> Self
    where
        S: WorkflowStep<Context = Ctx> + 'static,
    {
        self.steps.push(Box::new(StepWrapper::new(step)));
        self
    }

    /// Build the sequence from the accumulated steps.
    #[must_use]
    pub fn build(self) -> StepSequence<Ctx> {
        StepSequence::from_steps(self.name, self.steps)
    }
}
