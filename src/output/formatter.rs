//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use crate::{
    error::{AppError, Result},
    executor::{OfflineReport, RunReport, TransportOutcome, TransportReport},
    models::{EvaluationResult, IntervalRecord, Summary, Thresholds},
    types::TestStatus,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format parsed interval records as a table
    fn format_records(&self, records: &[IntervalRecord]) -> Result<String>;

    /// Format a threshold verdict
    fn format_evaluation(&self, evaluation: &EvaluationResult) -> Result<String>;

    /// Format run totals and averages
    fn format_summary(&self, summary: &Summary) -> Result<String>;

    /// Format one TCP or UDP pass
    fn format_transport(&self, report: &TransportReport) -> Result<String>;

    /// Format a complete validation run
    fn format_run_report(&self, report: &RunReport) -> Result<String>;

    /// Format the evaluation of saved client output
    fn format_offline_report(&self, report: &OfflineReport) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

pub(crate) fn fmt_error(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format output: {}", e))
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Enable verbose mode with detailed information
    pub verbose_mode: bool,
    /// Print every parsed interval, not just the verdict
    pub show_records: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            show_records: true,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
    /// Show header row
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn new(header: &str, alignment: Alignment, min_width: usize, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment,
            min_width,
            max_width,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Interval table, with a pass column when thresholds are given
    pub fn records_table(&self, records: &[IntervalRecord], thresholds: Option<Thresholds>) -> Result<String> {
        if records.is_empty() {
            return Ok("No interval lines found.".to_string());
        }

        let mut columns = vec![
            Column::new("Stream", Alignment::Right, 6, 6),
            Column::new("Interval", Alignment::Left, 16, 24),
            Column::new("Transfer", Alignment::Right, 12, 16),
            Column::new("Bitrate", Alignment::Right, 16, 20),
        ];
        let extended = records.iter().any(|r| r.retransmits.is_some());
        if extended {
            columns.push(Column::new("Retr", Alignment::Right, 4, 8));
            columns.push(Column::new("Cwnd", Alignment::Right, 12, 16));
        }
        if thresholds.is_some() {
            columns.push(Column::new("Result", Alignment::Center, 6, 6));
        }

        let format = TableFormat {
            columns,
            show_borders: self.options.table_borders,
            show_header: true,
        };

        let rows: Vec<RowData> = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    record.stream_id.map_or("-".to_string(), |id| id.to_string()),
                    record.interval.to_string(),
                    record.transfer.to_string(),
                    record.bitrate.to_string(),
                ];
                if extended {
                    row.push(record.retransmits.map_or("-".to_string(), |r| r.to_string()));
                    row.push(record.congestion_window.map_or("-".to_string(), |c| c.to_string()));
                }
                if let Some(thresholds) = thresholds {
                    row.push(if thresholds.is_cleared_by(record) { "pass" } else { "-" }.to_string());
                }
                row
            })
            .collect();

        self.create_table(&format, &rows)
    }

    /// Create a table with the given format and data
    pub fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        Ok(output.trim_end().to_string())
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let content = rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                content
                    .max(col.min_width)
                    .max(col.header.len())
                    .min(col.max_width.max(col.header.len()))
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map_or(Alignment::Left, |c| c.alignment);

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&align_text(cell, width, alignment));
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::from("+");
        for &width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn outcome_body(&self, outcome: &TransportOutcome) -> Result<String> {
        let mut output = String::new();

        match outcome {
            TransportOutcome::InvocationError { stderr } => {
                writeln!(output, "Client error:").map_err(fmt_error)?;
                write!(output, "  {}", stderr.replace('\n', "\n  ")).map_err(fmt_error)?;
            }
            TransportOutcome::Completed {
                records,
                evaluation,
                summary,
            } => {
                if self.options.show_records {
                    writeln!(output, "{}", self.records_table(records, Some(evaluation.thresholds))?)
                        .map_err(fmt_error)?;
                    writeln!(output).map_err(fmt_error)?;
                }
                writeln!(output, "{}", self.format_evaluation(evaluation)?).map_err(fmt_error)?;
                write!(output, "{}", self.format_summary(summary)?).map_err(fmt_error)?;
            }
        }

        Ok(output)
    }
}

/// Pad or cut `text` to exactly `width` characters
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = width - len;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Format a millisecond duration for humans
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1000.0 {
        format!("{:.0}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_error)?;
        writeln!(output, "  {}  ", title).map_err(fmt_error)?;
        write!(output, "{}", border).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_records(&self, records: &[IntervalRecord]) -> Result<String> {
        self.records_table(records, None)
    }

    fn format_evaluation(&self, evaluation: &EvaluationResult) -> Result<String> {
        let verdict = if evaluation.passed { "PASS" } else { "FAIL" };
        Ok(format!(
            "Verdict: {} ({} of {} intervals above {} MB and {} Mbit/s)",
            verdict,
            evaluation.passing.len(),
            evaluation.evaluated_count,
            evaluation.thresholds.min_transfer_mb,
            evaluation.thresholds.min_bitrate_mbps
        ))
    }

    fn format_summary(&self, summary: &Summary) -> Result<String> {
        let Some(stats) = summary.statistics() else {
            return Ok("Summary: no data".to_string());
        };

        let mut output = String::new();
        writeln!(output, "Summary ({} intervals):", stats.interval_count).map_err(fmt_error)?;
        writeln!(output, "  Total Transfer:   {:.2} MB", stats.total_transfer_mb).map_err(fmt_error)?;
        writeln!(output, "  Total Bitrate:    {:.2} Mbit/s", stats.total_bitrate_mbps).map_err(fmt_error)?;
        writeln!(output, "  Average Transfer: {:.2} MB", stats.average_transfer_mb).map_err(fmt_error)?;
        write!(output, "  Average Bitrate:  {:.2} Mbit/s", stats.average_bitrate_mbps).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_transport(&self, report: &TransportReport) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{} Test: {}", report.transport, report.status()).map_err(fmt_error)?;
        writeln!(output, "{}", "-".repeat(40)).map_err(fmt_error)?;
        write!(output, "{}", self.outcome_body(&report.outcome)?).map_err(fmt_error)?;
        Ok(output)
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header("Throughput Validation Results")?).map_err(fmt_error)?;
        writeln!(output, "Target:       {}:{}", report.target, report.port).map_err(fmt_error)?;
        writeln!(
            output,
            "Reachability: {}{}",
            if report.reachability.reachable { "reachable" } else { "unreachable" },
            report
                .reachability
                .packet_loss_percent
                .map_or(String::new(), |loss| format!(" ({}% packet loss)", loss))
        )
        .map_err(fmt_error)?;
        if let Some(ref error) = report.server_startup_error {
            writeln!(output, "Server:       startup error: {}", error).map_err(fmt_error)?;
        }
        if self.options.verbose_mode {
            writeln!(output, "Session:      {}", report.session_id).map_err(fmt_error)?;
            writeln!(output, "Duration:     {}", format_duration(report.duration_ms() as f64)).map_err(fmt_error)?;
        }

        for transport in &report.transports {
            writeln!(output).map_err(fmt_error)?;
            writeln!(output, "{}", self.format_transport(transport)?).map_err(fmt_error)?;
        }

        if let Some(ref check) = report.unreachable_check {
            writeln!(output).map_err(fmt_error)?;
            if check.detected_error {
                writeln!(output, "Unreachable Host ({}): PASS, client reported: {}", check.host, check.stderr)
                    .map_err(fmt_error)?;
            } else {
                writeln!(output, "Unreachable Host ({}): FAIL, no error reported", check.host).map_err(fmt_error)?;
            }
        }

        writeln!(output).map_err(fmt_error)?;
        if report.passed() {
            write!(output, "{}", self.format_success("all checks passed")?).map_err(fmt_error)?;
        } else {
            write!(output, "{}", self.format_error(&report.failures().join("; "))?).map_err(fmt_error)?;
        }

        Ok(output)
    }

    fn format_offline_report(&self, report: &OfflineReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header(&format!("Saved Output: {}", report.source))?)
            .map_err(fmt_error)?;
        writeln!(output, "{}", self.outcome_body(&report.outcome)?).map_err(fmt_error)?;
        writeln!(output).map_err(fmt_error)?;

        let message = match report.status() {
            TestStatus::Passed => self.format_success("at least one interval is above the thresholds")?,
            _ => self.format_error("no interval is above the thresholds")?,
        };
        write!(output, "{}", message).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("ERROR: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("SUCCESS: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::TimeInterval,
        units::{Bitrate, BitrateUnit, Transfer, TransferUnit},
    };

    fn plain() -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            ..Default::default()
        })
    }

    fn record(start: f64, mb: f64, mbps: f64) -> IntervalRecord {
        IntervalRecord::simple(
            TimeInterval::new(start, start + 1.0).unwrap(),
            Transfer::new(mb, TransferUnit::Megabytes),
            Bitrate::new(mbps, BitrateUnit::MegabitsPerSec),
        )
    }

    #[test]
    fn test_align_text() {
        assert_eq!(align_text("ab", 4, Alignment::Left), "ab  ");
        assert_eq!(align_text("ab", 4, Alignment::Right), "  ab");
        assert_eq!(align_text("ab", 5, Alignment::Center), " ab  ");
        assert_eq!(align_text("abcdef", 3, Alignment::Left), "abc");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250.0), "250ms");
        assert_eq!(format_duration(1500.0), "1.50s");
        assert_eq!(format_duration(90000.0), "1m30.0s");
    }

    #[test]
    fn test_records_table_marks_passing_rows() {
        let records = vec![record(0.0, 2.5, 25.0), record(1.0, 1.0, 10.0)];
        let table = plain().records_table(&records, Some(Thresholds::default())).unwrap();

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with('+'));
        assert!(lines[1].contains("Interval"));
        assert!(lines[3].contains("0.00-1.00 sec"));
        assert!(lines[3].contains("pass"));
        assert!(!lines[4].contains("pass"));
        // no TCP columns for simple records
        assert!(!lines[1].contains("Retr"));
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(plain().format_records(&[]).unwrap(), "No interval lines found.");
    }

    #[test]
    fn test_summary_no_data() {
        assert_eq!(plain().format_summary(&Summary::NoData).unwrap(), "Summary: no data");
    }

    #[test]
    fn test_evaluation_line() {
        let evaluation = crate::evaluation::ThresholdEvaluator::default()
            .evaluate(&[record(0.0, 2.5, 25.0), record(1.0, 2.0, 20.0)]);
        let line = plain().format_evaluation(&evaluation).unwrap();
        assert_eq!(line, "Verdict: PASS (1 of 2 intervals above 2 MB and 20 Mbit/s)");
    }

    #[test]
    fn test_invocation_error_transport() {
        let report = TransportReport {
            transport: crate::types::Transport::Tcp,
            outcome: TransportOutcome::InvocationError {
                stderr: "iperf3: error - unable to connect to server".to_string(),
            },
        };
        let text = plain().format_transport(&report).unwrap();
        assert!(text.starts_with("TCP Test: ERROR"));
        assert!(text.contains("unable to connect"));
    }
}
