use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use serde::{Serialize, Serializer};

/// Stable identifier classifying why a step invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The collaborator could not be reached.
    Connection,
    /// The collaborator rejected the supplied credentials.
    Authentication,
    /// The resource the step wanted to create is already there.
    AlreadyExists,
    /// The resource the step wanted to touch does not exist.
    NotFound,
    /// The step did not finish within its time budget.
    Timeout,
    /// The run was cancelled before the step started.
    Cancelled,
    /// The step panicked; the panic was caught at the step boundary.
    Panicked,
    /// The failure matched no known classification.
    Unclassified,
    /// A domain specific code chosen by a concrete step.
    Domain(Cow<'static, str>),
}

impl ErrorCode {
    /// Create a domain specific code.
    #[must_use]
    pub const fn domain(code: &'static str) -> Self {
        Self::Domain(Cow::Borrowed(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connection => "CONNECTION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Panicked => "PANICKED",
            Self::Unclassified => "UNCLASSIFIED",
            Self::Domain(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Which half of a step was running when a failure was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepPhase {
    #[serde(rename = "do")]
    Execute,
    #[serde(rename = "undo")]
    Compensate,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execute => f.write_str("do"),
            Self::Compensate => f.write_str("undo"),
        }
    }
}

/// A classified failure returned by a step.
///
/// The stack trace is captured when the failure is constructed, so build it
/// as close to the failing collaborator call as possible.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StepFailure {
    code: ErrorCode,
    message: String,
    trace: String,
}

impl StepFailure {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace: Backtrace::force_capture().to_string(),
        }
    }

    /// Build a failure from an error, flattening its source chain into the message.
    #[must_use]
    pub fn from_error<E>(code: ErrorCode, error: &E) -> Self
    where
        E: Error + ?Sized,
    {
        Self::new(code, render_chain(error))
    }

    #[must_use]
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Turn the failure into a log record attributed to `step`.
    #[must_use]
    pub fn into_record(self, step_index: usize, step: &str, phase: StepPhase) -> ErrorRecord {
        ErrorRecord {
            step_index,
            step: step.to_string(),
            phase,
            code: self.code,
            message: self.message,
            trace: self.trace,
        }
    }
}

fn render_chain<E>(error: &E) -> String
where
    E: Error + ?Sized,
{
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// One captured failure in a run's error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Position of the step in its sequence.
    pub step_index: usize,
    /// Name of the step that failed.
    pub step: String,
    /// Whether `do` or `undo` failed.
    pub phase: StepPhase,
    pub code: ErrorCode,
    pub message: String,
    /// Stack trace captured with the failure.
    pub trace: String,
}

/// Append-only, chronological log of captured failures.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ErrorLog {
    records: Vec<ErrorRecord>,
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Codes of all records, oldest first.
    #[must_use]
    pub fn codes(&self) -> Vec<&ErrorCode> {
        self.records.iter().map(|record| &record.code).collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ErrorRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a ErrorRecord;
    type IntoIter = std::slice::Iter<'a, ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
