//! Data models for interval records, evaluation results and configuration

pub mod config;
pub mod metrics;
pub mod record;

// Re-export main model types
pub use config::{Config, KnownHostsPolicy, OutputFormat, SshConfig};
pub use metrics::{EvaluationResult, Summary, SummaryStatistics, Thresholds};
pub use record::{IntervalRecord, LineShape, TimeInterval};
