use crate::error::ErrorLog;

/// State shared by every step of one run.
///
/// A context is owned by exactly one run and handed to each step by `&mut`,
/// so steps never need locking to read what earlier steps wrote. The only
/// thing the engine itself needs from it is the error log.
pub trait RunContext: Send {
    fn errors(&self) -> &ErrorLog;

    fn errors_mut(&mut self) -> &mut ErrorLog;
}
