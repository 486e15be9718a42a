mod formatter;
mod json;
mod plain;

use clap::ValueEnum;
use dbaas_saga::StepInfo;
use dbaas_workflow::WorkflowKind;
use serde::Serialize;

pub(crate) use formatter::OutputFormatter;
pub(crate) use json::JsonFormatter;
pub(crate) use plain::PlainTextFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    pub(crate) fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            Self::Plain => Box::new(PlainTextFormatter),
            Self::Json => Box::new(JsonFormatter),
        }
    }
}

/// A workflow and the steps it runs, for `list`.
#[derive(Debug, Serialize)]
pub(crate) struct WorkflowListing {
    pub(crate) workflow: WorkflowKind,
    pub(crate) steps: Vec<StepInfo>,
}
