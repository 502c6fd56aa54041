//! Property-based tests for aggregation and evaluation
//!
//! These check the arithmetic relationships between totals, averages and the
//! threshold verdict over arbitrary runs.

use super::SummaryAggregator;
use crate::{
    evaluation::ThresholdEvaluator,
    models::{
        metrics::{Summary, Thresholds},
        record::{IntervalRecord, TimeInterval},
    },
    units::{Bitrate, BitrateUnit, Transfer, TransferUnit},
};
use proptest::prelude::*;
use proptest::collection::vec;

mod generators {
    use super::*;

    pub fn transfer() -> impl Strategy<Value = Transfer> {
        (
            0.0f64..10_000.0,
            prop_oneof![
                Just(TransferUnit::Kilobytes),
                Just(TransferUnit::Megabytes),
                Just(TransferUnit::Gigabytes)
            ],
        )
            .prop_map(|(value, unit)| Transfer::new(value, unit))
    }

    pub fn bitrate() -> impl Strategy<Value = Bitrate> {
        (
            0.0f64..10_000.0,
            prop_oneof![
                Just(BitrateUnit::KilobitsPerSec),
                Just(BitrateUnit::MegabitsPerSec),
                Just(BitrateUnit::GigabitsPerSec)
            ],
        )
            .prop_map(|(value, unit)| Bitrate::new(value, unit))
    }

    pub fn records() -> impl Strategy<Value = Vec<IntervalRecord>> {
        vec((transfer(), bitrate()), 0..100).prop_map(|pairs| {
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (t, b))| {
                    let start = i as f64;
                    IntervalRecord::simple(TimeInterval::new(start, start + 1.0).unwrap(), t, b)
                })
                .collect()
        })
    }
}

proptest! {
    /// Average times count equals the total
    #[test]
    fn average_times_count_is_total(records in generators::records()) {
        match SummaryAggregator::new().summarize(&records) {
            Summary::NoData => prop_assert!(records.is_empty()),
            Summary::Computed(stats) => {
                prop_assert_eq!(stats.interval_count, records.len());
                let n = stats.interval_count as f64;
                prop_assert!((stats.average_transfer_mb * n - stats.total_transfer_mb).abs() < 1e-6 * stats.total_transfer_mb.max(1.0));
                prop_assert!((stats.average_bitrate_mbps * n - stats.total_bitrate_mbps).abs() < 1e-6 * stats.total_bitrate_mbps.max(1.0));
            }
        }
    }

    /// Averages lie between the smallest and largest normalized value
    #[test]
    fn average_between_min_and_max(records in generators::records()) {
        if let Summary::Computed(stats) = SummaryAggregator::new().summarize(&records) {
            let min = records.iter().map(|r| r.transfer_mb()).fold(f64::INFINITY, f64::min);
            let max = records.iter().map(|r| r.transfer_mb()).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(stats.average_transfer_mb >= min - 1e-9);
            prop_assert!(stats.average_transfer_mb <= max + 1e-9);
        }
    }

    /// The verdict is exactly "some record clears both minimums"
    #[test]
    fn verdict_is_existential(records in generators::records(), min_t in 0.0f64..100.0, min_b in 0.0f64..500.0) {
        let thresholds = Thresholds::new(min_t, min_b);
        let result = ThresholdEvaluator::new(thresholds).evaluate(&records);

        let expected = records
            .iter()
            .any(|r| r.transfer_mb() > min_t && r.bitrate_mbps() > min_b);
        prop_assert_eq!(result.passed, expected);
        prop_assert!(result.passing.iter().all(|r| thresholds.is_cleared_by(r)));
        prop_assert!(result.passing.len() <= records.len());
    }
}
