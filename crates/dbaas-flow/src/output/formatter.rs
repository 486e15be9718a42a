use dbaas_workflow::WorkflowResult;

use super::WorkflowListing;
use crate::error::Result;

pub(crate) trait OutputFormatter {
    fn format_result(&self, result: &WorkflowResult) -> Result<String>;
    fn format_listing(&self, listings: &[WorkflowListing]) -> Result<String>;
}
