//! Single-run aggregation of interval records

#[cfg(test)]
mod comprehensive_tests;

use crate::models::{
    metrics::{Summary, SummaryStatistics},
    record::IntervalRecord,
};

/// Totals and averages of transfer and bitrate across a run
///
/// Values are normalized to megabytes and megabits per second before they are
/// summed. An interval whose normalized values are not finite is skipped and
/// does not count towards the averages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryAggregator;

impl SummaryAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, records: &[IntervalRecord]) -> Summary {
        let mut count = 0usize;
        let mut total_transfer = 0.0;
        let mut total_bitrate = 0.0;

        for record in records {
            let transfer = record.transfer_mb();
            let bitrate = record.bitrate_mbps();
            if !transfer.is_finite() || !bitrate.is_finite() {
                continue;
            }
            total_transfer += transfer;
            total_bitrate += bitrate;
            count += 1;
        }

        if count == 0 {
            return Summary::NoData;
        }

        Summary::Computed(SummaryStatistics {
            interval_count: count,
            total_transfer_mb: total_transfer,
            total_bitrate_mbps: total_bitrate,
            average_transfer_mb: total_transfer / count as f64,
            average_bitrate_mbps: total_bitrate / count as f64,
        })
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

    #[test]
    fn test_totals_and_averages() {
        let records: Vec<_> = [(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]
            .iter()
            .enumerate()
            .map(|(i, &(mb, mbps))| {
                record(
                    i as f64,
                    Transfer::new(mb, TransferUnit::Megabytes),
                    Bitrate::new(mbps, BitrateUnit::MegabitsPerSec),
                )
            })
            .collect();

        let summary = SummaryAggregator::new().summarize(&records);
        let stats = summary.statistics().unwrap();
        assert_eq!(stats.interval_count, 3);
        assert_eq!(stats.total_transfer_mb, 6.0);
        assert_eq!(stats.average_transfer_mb, 2.0);
        assert_eq!(stats.total_bitrate_mbps, 60.0);
        assert_eq!(stats.average_bitrate_mbps, 20.0);
    }

    #[test]
    fn test_empty_is_no_data() {
        assert_eq!(SummaryAggregator::new().summarize(&[]), Summary::NoData);
    }

    #[test]
    fn test_mixed_units_are_normalized() {
        let records = vec![
            record(0.0, Transfer::new(1.0, TransferUnit::Gigabytes), Bitrate::new(1.0, BitrateUnit::GigabitsPerSec)),
            record(1.0, Transfer::new(1024.0, TransferUnit::Kilobytes), Bitrate::new(1024.0, BitrateUnit::KilobitsPerSec)),
        ];

        let summary = SummaryAggregator::new().summarize(&records);
        let stats = summary.statistics().unwrap();
        assert_eq!(stats.total_transfer_mb, 1025.0);
        assert_eq!(stats.total_bitrate_mbps, 1025.0);
        assert_eq!(stats.average_transfer_mb, 512.5);
    }

    #[test]
    fn test_non_finite_records_do_not_count() {
        // records built by hand can bypass the parser's checks
        let records = vec![
            record(0.0, Transfer::new(4.0, TransferUnit::Megabytes), Bitrate::new(40.0, BitrateUnit::MegabitsPerSec)),
            record(1.0, Transfer::new(f64::NAN, TransferUnit::Megabytes), Bitrate::new(40.0, BitrateUnit::MegabitsPerSec)),
        ];

        let summary = SummaryAggregator::new().summarize(&records);
        let stats = summary.statistics().unwrap();
        assert_eq!(stats.interval_count, 1);
        assert_eq!(stats.average_transfer_mb, 4.0);
        assert_eq!(stats.average_bitrate_mbps, 40.0);
    }

    #[test]
    fn test_all_skipped_is_no_data() {
        let records = vec![record(
            0.0,
            Transfer::new(f64::INFINITY, TransferUnit::Megabytes),
            Bitrate::new(1.0, BitrateUnit::MegabitsPerSec),
        )];
        assert!(SummaryAggregator::new().summarize(&records).is_no_data());
    }
}
