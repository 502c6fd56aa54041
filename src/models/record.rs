//! Interval record data model

use crate::units::{Bitrate, Transfer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting window of a single sample, in seconds since the run started
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    /// Build an interval; `None` unless both bounds are finite and `start < end`
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start >= 0.0 && start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Window length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}-{:.2} sec", self.start, self.end)
    }
}

/// Which line layout a record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineShape {
    /// Interval, transfer and bitrate only
    Simple,
    /// Stream id prefix plus retransmits and congestion window (TCP sender)
    Extended,
}

/// Which side of the connection an end-of-run total describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRole {
    Sender,
    Receiver,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => write!(f, "sender"),
            Self::Receiver => write!(f, "receiver"),
        }
    }
}

/// One measurement sample for a fixed time window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub interval: TimeInterval,
    pub transfer: Transfer,
    pub bitrate: Bitrate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retransmits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_window: Option<Transfer>,
    pub shape: LineShape,
    /// Set when the line is an end-of-run total rather than a sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<StreamRole>,
}

impl IntervalRecord {
    /// Record for a simple line
    pub fn simple(interval: TimeInterval, transfer: Transfer, bitrate: Bitrate) -> Self {
        Self {
            interval,
            transfer,
            bitrate,
            stream_id: None,
            retransmits: None,
            congestion_window: None,
            shape: LineShape::Simple,
            role: None,
        }
    }

    /// Mark the record as a sender or receiver total
    pub fn with_role(mut self, role: Option<StreamRole>) -> Self {
        self.role = role;
        self
    }

    pub fn is_total(&self) -> bool {
        self.role.is_some()
    }

    /// Attach the TCP-specific columns of an extended line
    pub fn with_tcp_details(mut self, stream_id: u32, retransmits: u64, congestion_window: Transfer) -> Self {
        self.stream_id = Some(stream_id);
        self.retransmits = Some(retransmits);
        self.congestion_window = Some(congestion_window);
        self.shape = LineShape::Extended;
        self
    }

    /// Normalized transfer in megabytes
    pub fn transfer_mb(&self) -> f64 {
        self.transfer.megabytes()
    }

    /// Normalized bitrate in megabits per second
    pub fn bitrate_mbps(&self) -> f64 {
        self.bitrate.megabits_per_sec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{BitrateUnit, TransferUnit};

    #[test]
    fn test_interval_requires_ordered_bounds() {
        assert!(TimeInterval::new(0.0, 1.0).is_some());
        assert!(TimeInterval::new(1.0, 1.0).is_none());
        assert!(TimeInterval::new(2.0, 1.0).is_none());
        assert!(TimeInterval::new(f64::NAN, 1.0).is_none());
    }

    #[test]
    fn test_interval_display() {
        let interval = TimeInterval::new(1.0, 2.0).unwrap();
        assert_eq!(interval.to_string(), "1.00-2.00 sec");
        assert_eq!(interval.duration(), 1.0);
    }

    #[test]
    fn test_normalized_accessors() {
        let record = IntervalRecord::simple(
            TimeInterval::new(0.0, 1.0).unwrap(),
            Transfer::new(1.0, TransferUnit::Gigabytes),
            Bitrate::new(512.0, BitrateUnit::KilobitsPerSec),
        );
        assert_eq!(record.transfer_mb(), 1024.0);
        assert_eq!(record.bitrate_mbps(), 0.5);
        assert_eq!(record.shape, LineShape::Simple);
    }

    #[test]
    fn test_tcp_details_switch_shape() {
        let record = IntervalRecord::simple(
            TimeInterval::new(0.0, 1.0).unwrap(),
            Transfer::new(11.2, TransferUnit::Megabytes),
            Bitrate::new(94.0, BitrateUnit::MegabitsPerSec),
        )
        .with_tcp_details(5, 3, Transfer::new(257.0, TransferUnit::Kilobytes));

        assert_eq!(record.shape, LineShape::Extended);
        assert_eq!(record.stream_id, Some(5));
        assert_eq!(record.retransmits, Some(3));
        assert_eq!(record.congestion_window.unwrap().unit, TransferUnit::Kilobytes);
    }

    #[test]
    fn test_role_marks_totals() {
        let record = IntervalRecord::simple(
            TimeInterval::new(0.0, 10.0).unwrap(),
            Transfer::new(112.0, TransferUnit::Megabytes),
            Bitrate::new(94.0, BitrateUnit::MegabitsPerSec),
        );
        assert!(!record.is_total());

        let total = record.with_role(Some(StreamRole::Receiver));
        assert!(total.is_total());
        assert_eq!(serde_json::to_value(&total).unwrap()["role"], "receiver");
    }
}
