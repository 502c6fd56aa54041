//! Evaluation and summary data models

use super::record::IntervalRecord;
use serde::{Deserialize, Serialize};

/// Minimum values an interval has to exceed to count as healthy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum transfer per interval, in megabytes
    pub min_transfer_mb: f64,
    /// Minimum bitrate per interval, in megabits per second
    pub min_bitrate_mbps: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_transfer_mb: crate::defaults::DEFAULT_MIN_TRANSFER_MB,
            min_bitrate_mbps: crate::defaults::DEFAULT_MIN_BITRATE_MBPS,
        }
    }
}

impl Thresholds {
    pub fn new(min_transfer_mb: f64, min_bitrate_mbps: f64) -> Self {
        Self { min_transfer_mb, min_bitrate_mbps }
    }

    /// Both normalized values must be strictly greater than their minimum
    pub fn is_cleared_by(&self, record: &IntervalRecord) -> bool {
        record.transfer_mb() > self.min_transfer_mb && record.bitrate_mbps() > self.min_bitrate_mbps
    }
}

/// Outcome of checking a run against its thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// True when at least one interval cleared both thresholds
    pub passed: bool,
    /// The intervals that cleared both thresholds, in run order
    pub passing: Vec<IntervalRecord>,
    /// Thresholds the records were checked against
    pub thresholds: Thresholds,
    /// Number of records that were considered
    pub evaluated_count: usize,
}

impl EvaluationResult {
    /// Share of evaluated intervals that passed, as a percentage
    pub fn pass_rate(&self) -> f64 {
        if self.evaluated_count == 0 {
            0.0
        } else {
            self.passing.len() as f64 / self.evaluated_count as f64 * 100.0
        }
    }
}

/// Totals and averages over a run, in base units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of intervals that contributed to the sums
    pub interval_count: usize,
    pub total_transfer_mb: f64,
    pub total_bitrate_mbps: f64,
    pub average_transfer_mb: f64,
    pub average_bitrate_mbps: f64,
}

/// Aggregate result; empty input is `NoData` rather than a division by zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Computed(SummaryStatistics),
}

impl Summary {
    pub fn statistics(&self) -> Option<&SummaryStatistics> {
        match self {
            Self::NoData => None,
            Self::Computed(stats) => Some(stats),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}
