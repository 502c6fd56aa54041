//! Colored formatter implementation with terminal color support
//!
//! This module provides a colored output formatter that uses ANSI colors and
//! a few Unicode symbols. Tables are laid out by the plain formatter and the
//! verdict cells are tinted afterwards.

use super::formatter::{fmt_error, format_duration, FormattingOptions, OutputFormatter, PlainFormatter};
use crate::{
    error::Result,
    executor::{OfflineReport, RunReport, TransportOutcome, TransportReport},
    models::{EvaluationResult, IntervalRecord, Summary},
    types::TestStatus,
};
use colored::*;
use std::fmt::Write as _;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
    pub border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        Self {
            plain_formatter: PlainFormatter::new(options.clone()),
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or untouched when colors are off
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn status_color(&self, status: TestStatus) -> Color {
        match status {
            TestStatus::Passed => self.color_scheme.success,
            TestStatus::Failed => self.color_scheme.warning,
            TestStatus::Errored => self.color_scheme.error,
        }
    }

    fn status_badge(&self, status: TestStatus) -> String {
        let symbol = match status {
            TestStatus::Passed => "✓",
            TestStatus::Failed => "✗",
            TestStatus::Errored => "!",
        };
        self.emphasize(&format!("{} {}", symbol, status.label()), self.status_color(status))
            .to_string()
    }

    fn create_section_header(&self, title: &str) -> String {
        format!("{}\n{}", self.emphasize(title, self.color_scheme.header), self.rule(title.chars().count()))
    }

    fn rule(&self, width: usize) -> ColoredString {
        self.colorize(&"─".repeat(width), self.color_scheme.border)
    }

    /// Tint the verdict column of a plain table
    fn tint_table(&self, table: String) -> String {
        if !self.options.enable_color {
            return table;
        }

        table
            .lines()
            .map(|line| {
                if line.starts_with('+') {
                    line.color(self.color_scheme.border).to_string()
                } else if line.contains(" pass ") {
                    line.replacen(" pass ", &format!(" {} ", "pass".green().bold()), 1)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn outcome_body(&self, outcome: &TransportOutcome) -> Result<String> {
        let mut output = String::new();

        match outcome {
            TransportOutcome::InvocationError { stderr } => {
                writeln!(output, "{}", self.colorize("Client error:", self.color_scheme.error)).map_err(fmt_error)?;
                write!(output, "  {}", stderr.replace('\n', "\n  ")).map_err(fmt_error)?;
            }
            TransportOutcome::Completed {
                records,
                evaluation,
                summary,
            } => {
                if self.options.show_records {
                    let table = self
                        .plain_formatter
                        .records_table(records, Some(evaluation.thresholds))?;
                    writeln!(output, "{}\n", self.tint_table(table)).map_err(fmt_error)?;
                }
                writeln!(output, "{}", self.format_evaluation(evaluation)?).map_err(fmt_error)?;
                write!(output, "{}", self.format_summary(summary)?).map_err(fmt_error)?;
            }
        }

        Ok(output)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "═".repeat(title.chars().count() + 4);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(fmt_error)?;
        writeln!(output, "  {}  ", self.emphasize(title, self.color_scheme.header)).map_err(fmt_error)?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.border)).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_records(&self, records: &[IntervalRecord]) -> Result<String> {
        let table = self.plain_formatter.format_records(records)?;
        Ok(self.tint_table(table))
    }

    fn format_evaluation(&self, evaluation: &EvaluationResult) -> Result<String> {
        let status = if evaluation.passed { TestStatus::Passed } else { TestStatus::Failed };
        let detail = format!(
            "{} of {} intervals above {} MB and {} Mbit/s ({:.0}%)",
            evaluation.passing.len(),
            evaluation.evaluated_count,
            evaluation.thresholds.min_transfer_mb,
            evaluation.thresholds.min_bitrate_mbps,
            evaluation.pass_rate()
        );
        Ok(format!("Verdict: {} {}", self.status_badge(status), self.colorize(&detail, self.color_scheme.muted)))
    }

    fn format_summary(&self, summary: &Summary) -> Result<String> {
        let Some(stats) = summary.statistics() else {
            return Ok(format!("Summary: {}", self.colorize("no data", self.color_scheme.warning)));
        };

        let value = |v: f64, unit: &str| self.colorize(&format!("{:.2} {}", v, unit), self.color_scheme.info);

        let mut output = String::new();
        writeln!(output, "Summary ({} intervals):", stats.interval_count).map_err(fmt_error)?;
        writeln!(output, "  Total Transfer:   {}", value(stats.total_transfer_mb, "MB")).map_err(fmt_error)?;
        writeln!(output, "  Total Bitrate:    {}", value(stats.total_bitrate_mbps, "Mbit/s")).map_err(fmt_error)?;
        writeln!(output, "  Average Transfer: {}", value(stats.average_transfer_mb, "MB")).map_err(fmt_error)?;
        write!(output, "  Average Bitrate:  {}", value(stats.average_bitrate_mbps, "Mbit/s")).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_transport(&self, report: &TransportReport) -> Result<String> {
        let mut output = String::new();
        writeln!(
            output,
            "{}  {}",
            self.create_section_header(&format!("{} Test", report.transport)),
            self.status_badge(report.status())
        )
        .map_err(fmt_error)?;
        write!(output, "{}", self.outcome_body(&report.outcome)?).map_err(fmt_error)?;
        Ok(output)
    }

    fn format_run_report(&self, report: &RunReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header("Throughput Validation Results")?).map_err(fmt_error)?;
        writeln!(
            output,
            "Target:       {}",
            self.emphasize(&format!("{}:{}", report.target, report.port), self.color_scheme.info)
        )
        .map_err(fmt_error)?;

        let reachability = if report.reachability.reachable {
            self.colorize("reachable", self.color_scheme.success)
        } else {
            self.colorize("unreachable", self.color_scheme.error)
        };
        let loss = report
            .reachability
            .packet_loss_percent
            .map_or(String::new(), |loss| format!(" ({}% packet loss)", loss));
        writeln!(output, "Reachability: {}{}", reachability, loss).map_err(fmt_error)?;

        if let Some(ref error) = report.server_startup_error {
            writeln!(output, "Server:       {}", self.colorize(&format!("startup error: {}", error), self.color_scheme.error))
                .map_err(fmt_error)?;
        }
        if self.options.verbose_mode {
            writeln!(output, "Session:      {}", self.colorize(&report.session_id, self.color_scheme.muted))
                .map_err(fmt_error)?;
            writeln!(output, "Duration:     {}", format_duration(report.duration_ms() as f64)).map_err(fmt_error)?;
        }

        for transport in &report.transports {
            writeln!(output).map_err(fmt_error)?;
            writeln!(output, "{}", self.format_transport(transport)?).map_err(fmt_error)?;
        }

        if let Some(ref check) = report.unreachable_check {
            writeln!(output).map_err(fmt_error)?;
            let status = if check.detected_error { TestStatus::Passed } else { TestStatus::Failed };
            let detail = if check.detected_error {
                format!("client reported: {}", check.stderr)
            } else {
                "no error reported".to_string()
            };
            writeln!(
                output,
                "Unreachable Host ({}): {} {}",
                check.host,
                self.status_badge(status),
                self.colorize(&detail, self.color_scheme.muted)
            )
            .map_err(fmt_error)?;
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

        writeln!(output, "{}", self.format_header(&format!("Saved Output: {}", report.source))?).map_err(fmt_error)?;
        writeln!(output, "{}\n", self.outcome_body(&report.outcome)?).map_err(fmt_error)?;

        let message = if report.passed() {
            self.format_success("at least one interval is above the thresholds")?
        } else {
            self.format_error("no interval is above the thresholds")?
        };
        write!(output, "{}", message).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✗ Error:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("⚠ Warning:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓ Success:", self.color_scheme.success), message))
    }
}
