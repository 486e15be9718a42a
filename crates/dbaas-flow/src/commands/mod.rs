mod check;
mod list;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Subcommand};
use dbaas_workflow::WorkflowKind;

use crate::error::Result;
use crate::output::OutputFormat;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a workflow, rolling back completed steps if one fails
    Run(RunArgs),
    /// List the available workflows and their steps
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Validate a run file for a workflow without running anything
    Check(CheckArgs),
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Workflow to run (see `list`)
    pub(crate) workflow: WorkflowKind,

    /// Run file describing the instance and driver script
    #[arg(long, short = 'c')]
    pub(crate) config: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub(crate) format: OutputFormat,

    /// Per-step time budget in seconds, overriding the run file
    #[arg(long, value_name = "SECONDS")]
    pub(crate) timeout: Option<u64>,
}

#[derive(Args)]
pub(crate) struct CheckArgs {
    pub(crate) workflow: WorkflowKind,

    #[arg(long, short = 'c')]
    pub(crate) config: PathBuf,
}

/// How a command finished when it did not error out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    /// The command ran, but the workflow did not succeed.
    WorkflowFailed,
}

impl Outcome {
    pub(crate) fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::WorkflowFailed => ExitCode::from(2),
        }
    }
}

impl Commands {
    pub(crate) async fn execute(self) -> Result<Outcome> {
        match self {
            Self::Run(args) => run::run(args).await,
            Self::List { format } => list::run(format),
            Self::Check(args) => check::run(&args),
        }
    }
}
