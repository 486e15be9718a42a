use std::fmt::Write;

use dbaas_workflow::WorkflowResult;

use super::{OutputFormatter, WorkflowListing};
use crate::error::Result;

pub(crate) struct PlainTextFormatter;

impl PlainTextFormatter {
    fn format_failed_step(output: &mut String, result: &WorkflowResult) {
        if let Some(step) = &result.failed_step {
            let _ = writeln!(
                output,
                "Failed at step {} ({}): {} [{}]",
                step.index, step.name, step.description, step.code
            );
        }
    }

    fn format_audit(output: &mut String, result: &WorkflowResult) {
        if let Some(audit) = &result.audit {
            let summary = audit.summary();
            if !summary.is_empty() {
                output.push_str("\nSteps:\n");
                for line in summary.lines() {
                    let _ = writeln!(output, "  {line}");
                }
            }
        }
    }

    fn format_errors(output: &mut String, result: &WorkflowResult) {
        if result.errors.is_empty() {
            return;
        }
        output.push_str("\nErrors:\n");
        for record in &result.errors {
            let _ = writeln!(
                output,
                "  [{}] {} ({}) {}: {}",
                record.step_index, record.step, record.phase, record.code, record.message
            );
        }
    }
}

impl OutputFormatter for PlainTextFormatter {
    fn format_result(&self, result: &WorkflowResult) -> Result<String> {
        let mut output = String::new();
        let verdict = if result.success { "succeeded" } else { "failed" };
        let _ = writeln!(
            output,
            "Workflow '{}' {verdict} ({})",
            result.workflow, result.state
        );
        Self::format_failed_step(&mut output, result);
        Self::format_audit(&mut output, result);
        Self::format_errors(&mut output, result);
        Ok(output)
    }

    fn format_listing(&self, listings: &[WorkflowListing]) -> Result<String> {
        let mut output = String::new();
        for listing in listings {
            let _ = writeln!(output, "{}:", listing.workflow);
            for step in &listing.steps {
                let _ = writeln!(output, "  {}. {} - {}", step.index + 1, step.name, step.description);
            }
        }
        Ok(output)
    }
}
