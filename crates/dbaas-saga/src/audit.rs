use std::fmt::Write;
use std::time::{Duration, Instant};

/// Where a step ended up in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// `do` is running, or finished without error.
    Executed,
    /// `do` failed; this step triggered the rollback.
    Failed,
    /// Never started because the run was cancelled.
    Cancelled,
    Compensated,
    CompensationFailed,
}

impl StepStatus {
    fn mark(self) -> &'static str {
        match self {
            Self::Executed => "✓",
            Self::Failed => "✗",
            Self::Cancelled => "⊘",
            Self::Compensated => "↩",
            Self::CompensationFailed => "⚠",
        }
    }
}

/// One step's entry in a [`RunAuditLog`].
#[derive(Debug)]
pub struct StepRecord {
    pub index: usize,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub started_at: Instant,
    /// Set when `do` finishes and moved forward again by its `undo`.
    pub completed_at: Option<Instant>,
    pub compensation_description: Option<String>,
}

impl StepRecord {
    fn new(index: usize, name: &str, description: String, status: StepStatus) -> Self {
        Self {
            index,
            name: name.to_string(),
            description,
            status,
            started_at: Instant::now(),
            completed_at: None,
            compensation_description: None,
        }
    }

    /// Time from start to the last recorded completion.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at
            .map(|completed| completed.duration_since(self.started_at))
    }
}

/// Per step history of one run, in the order steps were reached.
///
/// Entries are keyed by step index, so a sequence may reuse a step name.
#[derive(Debug, Default)]
pub struct RunAuditLog {
    records: Vec<StepRecord>,
}

impl RunAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&mut self, index: usize, name: &str, description: String) {
        self.records
            .push(StepRecord::new(index, name, description, StepStatus::Executed));
    }

    pub(crate) fn record_cancelled(&mut self, index: usize, name: &str, description: String) {
        let mut record = StepRecord::new(index, name, description, StepStatus::Cancelled);
        record.completed_at = Some(record.started_at);
        self.records.push(record);
    }

    /// Close the step started last with the outcome of its `do`.
    pub(crate) fn record_finished(&mut self, status: StepStatus, compensation_description: String) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
            record.compensation_description = Some(compensation_description);
        }
    }

    pub(crate) fn record_compensated(&mut self, index: usize) {
        self.update(index, StepStatus::Compensated);
    }

    pub(crate) fn record_compensation_failed(&mut self, index: usize) {
        self.update(index, StepStatus::CompensationFailed);
    }

    fn update(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.index == index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// The entry of the step at `index`, if the run reached it.
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.index == index)
    }

    /// One line per reached step: status mark, description and, once the
    /// step has finished, how long it took.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        for record in &self.records {
            if !summary.is_empty() {
                summary.push('\n');
            }
            let _ = write!(summary, "{} {}", record.status.mark(), record.description);
            if let Some(millis) = record
                .elapsed()
                .map(|elapsed| elapsed.as_millis())
                .filter(|millis| *millis > 0)
            {
                let _ = write!(summary, " ({millis}ms)");
            }
        }
        summary
    }
}
