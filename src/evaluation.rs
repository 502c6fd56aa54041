//! Threshold evaluation over a run's interval records

use crate::models::{
    metrics::{EvaluationResult, Thresholds},
    record::IntervalRecord,
};

/// Decides whether a run is healthy
///
/// A run passes when at least one interval exceeds both minimums after unit
/// normalization. A single good interval is enough.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator {
    thresholds: Thresholds,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Evaluate with the configured thresholds
    pub fn evaluate(&self, records: &[IntervalRecord]) -> EvaluationResult {
        self.evaluate_with(records, self.thresholds)
    }

    /// Evaluate with thresholds overridden for this call only
    pub fn evaluate_with(&self, records: &[IntervalRecord], thresholds: Thresholds) -> EvaluationResult {
        let passing: Vec<IntervalRecord> = records
            .iter()
            .filter(|record| thresholds.is_cleared_by(record))
            .cloned()
            .collect();

        EvaluationResult {
            passed: !passing.is_empty(),
            passing,
            thresholds,
            evaluated_count: records.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::TimeInterval;
    use crate::units::{Bitrate, BitrateUnit, Transfer, TransferUnit};

    fn record(start: f64, transfer: Transfer, bitrate: Bitrate) -> IntervalRecord {
        IntervalRecord::simple(TimeInterval::new(start, start + 1.0).unwrap(), transfer, bitrate)
    }

    fn mb(value: f64) -> Transfer {
        Transfer::new(value, TransferUnit::Megabytes)
    }

    fn mbps(value: f64) -> Bitrate {
        Bitrate::new(value, BitrateUnit::MegabitsPerSec)
    }

    #[test]
    fn test_single_good_interval_passes_run() {
        let records = vec![record(0.0, mb(2.5), mbps(25.0)), record(1.0, mb(1.0), mbps(10.0))];

        let result = ThresholdEvaluator::default().evaluate(&records);
        assert!(result.passed);
        assert_eq!(result.passing, vec![records[0].clone()]);
        assert_eq!(result.evaluated_count, 2);
    }

    #[test]
    fn test_boundary_values_fail() {
        let records = vec![record(0.0, mb(2.0), mbps(20.0))];

        let result = ThresholdEvaluator::default().evaluate(&records);
        assert!(!result.passed);
        assert!(result.passing.is_empty());
    }

    #[test]
    fn test_both_thresholds_required() {
        let records = vec![record(0.0, mb(50.0), mbps(5.0)), record(1.0, mb(0.5), mbps(500.0))];
        assert!(!ThresholdEvaluator::default().evaluate(&records).passed);
    }

    #[test]
    fn test_units_are_normalized_before_comparison() {
        // 3000 KBytes is under 3 MB, 0.03 Gbits/sec is over 30 Mbits/sec
        let kilo = record(0.0, Transfer::new(3000.0, TransferUnit::Kilobytes), mbps(25.0));
        let giga = record(1.0, mb(2.5), Bitrate::new(0.03, BitrateUnit::GigabitsPerSec));
        let tiny = record(2.0, Transfer::new(1500.0, TransferUnit::Kilobytes), mbps(25.0));

        let result = ThresholdEvaluator::default().evaluate(&[kilo.clone(), giga.clone(), tiny]);
        assert_eq!(result.passing, vec![kilo, giga]);
    }

    #[test]
    fn test_empty_records_fail_without_error() {
        let result = ThresholdEvaluator::default().evaluate(&[]);
        assert!(!result.passed);
        assert_eq!(result.evaluated_count, 0);
        assert_eq!(result.pass_rate(), 0.0);
    }

    #[test]
    fn test_per_call_override() {
        let records = vec![record(0.0, mb(2.5), mbps(25.0))];
        let evaluator = ThresholdEvaluator::default();

        let strict = evaluator.evaluate_with(&records, Thresholds::new(10.0, 100.0));
        assert!(!strict.passed);
        assert_eq!(strict.thresholds.min_transfer_mb, 10.0);

        // the configured thresholds are untouched
        assert!(evaluator.evaluate(&records).passed);
    }

    #[test]
    fn test_passing_keeps_run_order() {
        let records: Vec<_> = (0..5).map(|i| record(i as f64, mb(3.0), mbps(30.0 + i as f64))).collect();
        let result = ThresholdEvaluator::new(Thresholds::new(2.0, 31.5)).evaluate(&records);

        let starts: Vec<f64> = result.passing.iter().map(|r| r.interval.start).collect();
        assert_eq!(starts, vec![2.0, 3.0, 4.0]);
    }
}
