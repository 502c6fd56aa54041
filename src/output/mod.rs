//! Output formatting and display system
//!
//! This module provides a flexible output formatting system for run results,
//! supporting colored and plain text tables as well as JSON.

mod colored;
mod formatter;
mod json;

pub use colored::{ColorScheme, ColoredFormatter};
pub use formatter::{
    align_text, format_duration, Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData,
    TableFormat,
};
pub use json::JsonFormatter;

use crate::{
    config::ValidationWarning,
    error::Result,
    executor::{OfflineReport, RunReport},
    models::{Config, OutputFormat},
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a table formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            show_records: true,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Pick the formatter the configuration asks for
    pub fn from_config(config: &Config) -> Box<dyn OutputFormatter> {
        match config.output_format {
            OutputFormat::Json => Box::new(JsonFormatter::new(true)),
            OutputFormat::Table => Self::create_formatter(config.enable_color, config.verbose),
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, true)
    }
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    format: OutputFormat,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Box<dyn OutputFormatter>, format: OutputFormat) -> Self {
        Self { formatter, format }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(OutputFormatterFactory::from_config(config), config.output_format)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Render a full validation run
    pub fn display_run_report(&self, report: &RunReport) -> Result<String> {
        self.formatter.format_run_report(report)
    }

    /// Render the verdict over a saved output file
    pub fn display_offline_report(&self, report: &OfflineReport) -> Result<String> {
        self.formatter.format_offline_report(report)
    }

    /// Render configuration warnings, one per line
    ///
    /// JSON output gets none so stdout stays a single document.
    pub fn display_warnings(&self, warnings: &[ValidationWarning], use_color: bool) -> Option<String> {
        if self.is_json() || warnings.is_empty() {
            return None;
        }

        Some(
            warnings
                .iter()
                .map(|w| w.format(use_color))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
