//! Structured logging for throughput validation runs
//!
//! This module provides:
//! - Structured logging with multiple levels and contexts
//! - Debug mode detailed tracing
//! - A run logger for reachability checks, process invocations, remote
//!   server steps and verdicts
//! - JSON structured output for integration with log aggregators
//!
//! Every entry goes to stderr so stdout stays reserved for the report.

use crate::error::AppError;
use crate::models::Config;
use crate::types::{TestStatus, Transport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Process invocations, remote steps and phase timings
    Debug,
    /// Reachability and passing verdicts
    Info,
    /// Failed verdicts and failed steps
    Warn,
    Error,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    pub thread_id: Option<String>,
}

/// Logger implementation with multiple output formats
pub struct Logger {
    /// Minimum log level to output
    min_level: LogLevel,
    use_color: bool,
    format: LogFormat,
    name: String,
    /// Shared context storage
    context: Arc<RwLock<LogContext>>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

impl Logger {
    /// Create a logger with specific configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Debug, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder {
        self.log(LogLevel::Error, message)
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry),
            LogFormat::Json => self.format_json(&entry),
        };

        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                thread_id: std::thread::current().name().map(String::from),
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the steps of a validation run
pub struct RunLogger {
    logger: Logger,
}

impl RunLogger {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("RUN".to_string(), config))
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// Underlying logger, for entries that have no dedicated method
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log the outcome of the reachability check
    pub async fn log_reachability(&self, host: &str, reachable: bool, elapsed: Duration) {
        let level = if reachable { LogLevel::Info } else { LogLevel::Error };
        let message = format!(
            "Host {} is {}",
            host,
            if reachable { "reachable" } else { "unreachable" }
        );

        self.logger
            .log(level, &message)
            .field("host", host)
            .field("reachable", reachable)
            .field("duration_ms", elapsed.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    /// Log an external process invocation and how it ended
    pub async fn log_process(&self, program: &str, args: &[String], exit_code: Option<i32>, elapsed: Duration) {
        let success = exit_code == Some(0);
        let level = if success { LogLevel::Debug } else { LogLevel::Warn };
        let message = format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            exit_code.map_or("no status".to_string(), |c| c.to_string())
        );

        self.logger
            .log(level, &message)
            .field("program", program)
            .field("args", args)
            .field("exit_code", exit_code)
            .field("duration_ms", elapsed.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    /// Log a step on the remote server host
    pub async fn log_remote_step(&self, host: &str, step: &str, success: bool, detail: Option<&str>) {
        let level = if success { LogLevel::Debug } else { LogLevel::Warn };
        let message = match detail {
            Some(detail) if !success => format!("Remote {} on {} failed: {}", step, host, detail),
            _ => format!("Remote {} on {}: {}", step, host, if success { "ok" } else { "failed" }),
        };

        let mut builder = self
            .logger
            .log(level, &message)
            .field("host", host)
            .field("step", step)
            .field("success", success);

        if let Some(detail) = detail {
            builder = builder.field("detail", detail);
        }

        builder.log().await;
    }

    /// Log the verdict of one transport pass
    pub async fn log_verdict(&self, transport: Transport, status: TestStatus, passing: usize, evaluated: usize) {
        let level = match status {
            TestStatus::Passed => LogLevel::Info,
            TestStatus::Failed => LogLevel::Warn,
            TestStatus::Errored => LogLevel::Error,
        };
        let message = format!(
            "{} verdict {}: {} of {} intervals above thresholds",
            transport, status, passing, evaluated
        );

        self.logger
            .log(level, &message)
            .field("transport", transport)
            .field("status", status)
            .field("passing_intervals", passing)
            .field("evaluated_intervals", evaluated)
            .log()
            .await;
    }

    /// Log how long a phase of the run took
    pub async fn log_phase(&self, phase: &str, elapsed: Duration) {
        self.logger
            .debug(&format!("Phase {} took {}ms", phase, elapsed.as_millis()))
            .field("phase", phase)
            .field("duration_ms", elapsed.as_secs_f64() * 1000.0)
            .log()
            .await;
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message).error_info(error);
        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Global logger factory and management
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    /// Create a run logger that carries the session id
    pub async fn create_run_logger(&self) -> RunLogger {
        RunLogger::from_logger(self.create_logger("RUN").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
