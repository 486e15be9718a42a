use dbaas_workflow::WorkflowResult;

use super::{OutputFormatter, WorkflowListing};
use crate::error::Result;

pub(crate) struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_result(&self, result: &WorkflowResult) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string_pretty(result)?))
    }

    fn format_listing(&self, listings: &[WorkflowListing]) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string_pretty(listings)?))
    }
}
