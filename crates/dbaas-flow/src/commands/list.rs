use dbaas_workflow::WorkflowKind;
use dbaas_workflow::providers::{ScriptAccessProvider, ScriptExecutor};

use super::Outcome;
use crate::error::Result;
use crate::output::{OutputFormat, WorkflowListing};

pub(crate) fn run(format: OutputFormat) -> Result<Outcome> {
    let listings: Vec<WorkflowListing> = WorkflowKind::ALL
        .into_iter()
        .map(|kind| WorkflowListing {
            workflow: kind,
            steps: kind
                .sequence::<ScriptExecutor, ScriptAccessProvider<ScriptExecutor>>()
                .steps(),
        })
        .collect();

    print!("{}", format.formatter().format_listing(&listings)?);
    Ok(Outcome::Success)
}
