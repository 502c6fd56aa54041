//! JSON output for scripts and CI pipelines

use super::formatter::OutputFormatter;
use crate::{
    error::Result,
    executor::{OfflineReport, RunReport, TransportReport},
    models::{EvaluationResult, IntervalRecord, Summary},
};
use serde::Serialize;
use serde_json::json;

/// Renders models as JSON documents
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_header(&self, _title: &str) -> Result<String> {
        Ok(String::new())
    }

    fn format_records(&self, records: &[IntervalRecord]) -> Result<String> {
        self.render(records)
    }

    fn format_evaluation(&self, evaluation: &EvaluationResult) -> Result<String> {
        self.render(evaluation)
    }

    fn format_summary(&self, summary: &Summary) -> Result<String> {
        self.render(summary)
    }

    fn format_transport(&self, report: &TransportReport) -> Result<String> {
        self.render(report)
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        self.render(&json!({
            "passed": report.passed(),
            "failures": report.failures(),
            "report": report,
        }))
    }

    fn format_offline_report(&self, report: &OfflineReport) -> Result<String> {
        self.render(&json!({
            "passed": report.passed(),
            "report": report,
        }))
    }

    fn format_error(&self, error: &str) -> Result<String> {
        self.render(&json!({ "error": error }))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        self.render(&json!({ "warning": warning }))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        self.render(&json!({ "success": message }))
    }
}
