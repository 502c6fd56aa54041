//! Network Throughput Validator
//!
//! Runs iperf3 against a remote server and checks that the measured
//! throughput clears configurable transfer and bitrate minimums. The core
//! parses iperf3's interval lines, normalizes their units, evaluates the run
//! and summarizes it. The orchestration layer checks reachability with ping,
//! manages the remote server over SSH and drives the iperf3 client.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod parser;
pub mod remote;
pub mod stats;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use evaluation::ThresholdEvaluator;
pub use models::{Config, EvaluationResult, IntervalRecord, Summary, SummaryStatistics, Thresholds};
pub use output::{ColoredFormatter, JsonFormatter, OutputCoordinator, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use parser::OutputParser;
pub use stats::SummaryAggregator;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Version line with build metadata from build.rs
pub const BUILD_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

pub fn build_info() -> &'static str {
    BUILD_INFO
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 5201;
    pub const DEFAULT_PING_COUNT: u32 = 4;
    pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_REPORT_INTERVAL_SECS: u32 = 1;
    pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_MIN_TRANSFER_MB: f64 = 2.0;
    pub const DEFAULT_MIN_BITRATE_MBPS: f64 = 20.0;
    pub const DEFAULT_IPERF3_PATH: &str = "iperf3";
    pub const DEFAULT_PING_PATH: &str = "ping";
    pub const DEFAULT_SSH_PORT: u16 = 22;
    pub const DEFAULT_SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_SERVER_STARTUP_DELAY: Duration = Duration::from_millis(1000);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
