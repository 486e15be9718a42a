use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Cooperative cancellation shared between a run and whoever may stop it.
///
/// Cancelling never interrupts the step that is already running. The
/// executor checks the token before each forward step and, once it is set,
/// treats the next step as failed without starting it. Only the first reason
/// is kept.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    reason: Arc<OnceCell<String>>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns `false` if the token was already cancelled.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        self.reason.set(reason.into()).is_ok()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.reason.get().is_some()
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }
}
