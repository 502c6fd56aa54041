//! Magnitude-prefixed units for data volume and bitrate
//!
//! iperf3 reports transfer as `KBytes`/`MBytes`/`GBytes` and bitrate as
//! `Kbits/sec`/`Mbits/sec`/`Gbits/sec`. Every comparison or aggregation works on
//! values normalized to the base units: megabytes for volume and megabits per
//! second for rate. The two families are separate types so a volume can never be
//! normalized as a rate or the other way around.
//!
//! A stalled interval is printed without a prefix (`0.00 Bytes  0.00 bits/sec`).
//! Those columns are rescaled into the kilo magnitude when read, so the unit
//! enums stay closed over K/M/G and the stall still counts as a sample.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary step between neighbouring magnitudes
pub const MAGNITUDE_STEP: f64 = 1024.0;

/// Kilo/Mega/Giga magnitude prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Magnitude {
    Kilo,
    Mega,
    Giga,
}

impl Magnitude {
    /// Scale a value expressed in this magnitude to the mega magnitude
    pub fn to_mega(self, value: f64) -> f64 {
        match self {
            Self::Kilo => value / MAGNITUDE_STEP,
            Self::Mega => value,
            Self::Giga => value * MAGNITUDE_STEP,
        }
    }

    /// Parse the single-letter prefix iperf3 prints (`K`, `M`, `G`)
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "K" => Some(Self::Kilo),
            "M" => Some(Self::Mega),
            "G" => Some(Self::Giga),
            _ => None,
        }
    }

    /// Single-letter prefix for display
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Kilo => "K",
            Self::Mega => "M",
            Self::Giga => "G",
        }
    }
}

/// Data volume unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferUnit {
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl TransferUnit {
    pub fn magnitude(self) -> Magnitude {
        match self {
            Self::Kilobytes => Magnitude::Kilo,
            Self::Megabytes => Magnitude::Mega,
            Self::Gigabytes => Magnitude::Giga,
        }
    }

    pub fn from_magnitude(magnitude: Magnitude) -> Self {
        match magnitude {
            Magnitude::Kilo => Self::Kilobytes,
            Magnitude::Mega => Self::Megabytes,
            Magnitude::Giga => Self::Gigabytes,
        }
    }

    /// Convert a value in this unit to megabytes
    pub fn to_megabytes(self, value: f64) -> f64 {
        self.magnitude().to_mega(value)
    }
}

impl fmt::Display for TransferUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Bytes", self.magnitude().prefix())
    }
}

impl FromStr for TransferUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_suffix("Bytes")
            .and_then(Magnitude::from_prefix)
            .map(Self::from_magnitude)
            .ok_or_else(|| UnitParseError(s.to_string()))
    }
}

/// Bitrate unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitrateUnit {
    KilobitsPerSec,
    MegabitsPerSec,
    GigabitsPerSec,
}

impl BitrateUnit {
    pub fn magnitude(self) -> Magnitude {
        match self {
            Self::KilobitsPerSec => Magnitude::Kilo,
            Self::MegabitsPerSec => Magnitude::Mega,
            Self::GigabitsPerSec => Magnitude::Giga,
        }
    }

    pub fn from_magnitude(magnitude: Magnitude) -> Self {
        match magnitude {
            Magnitude::Kilo => Self::KilobitsPerSec,
            Magnitude::Mega => Self::MegabitsPerSec,
            Magnitude::Giga => Self::GigabitsPerSec,
        }
    }

    /// Convert a value in this unit to megabits per second
    pub fn to_megabits_per_sec(self, value: f64) -> f64 {
        self.magnitude().to_mega(value)
    }
}

impl fmt::Display for BitrateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bits/sec", self.magnitude().prefix())
    }
}

impl FromStr for BitrateUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_suffix("bits/sec")
            .and_then(Magnitude::from_prefix)
            .map(Self::from_magnitude)
            .ok_or_else(|| UnitParseError(s.to_string()))
    }
}

/// Unit text outside the K/M/G enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported unit '{0}'")]
pub struct UnitParseError(pub String);

/// Data volume with its unit as reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub value: f64,
    pub unit: TransferUnit,
}

impl Transfer {
    pub fn new(value: f64, unit: TransferUnit) -> Self {
        Self { value, unit }
    }

    /// Build from a value and unit column; bare `Bytes` is rescaled to kilobytes
    pub fn from_column(value: f64, unit: &str) -> Result<Self, UnitParseError> {
        match unit {
            "Bytes" => Ok(Self::new(value / MAGNITUDE_STEP, TransferUnit::Kilobytes)),
            _ => Ok(Self::new(value, unit.parse()?)),
        }
    }

    /// Normalized value in megabytes
    pub fn megabytes(&self) -> f64 {
        self.unit.to_megabytes(self.value)
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Bitrate with its unit as reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bitrate {
    pub value: f64,
    pub unit: BitrateUnit,
}

impl Bitrate {
    pub fn new(value: f64, unit: BitrateUnit) -> Self {
        Self { value, unit }
    }

    /// Build from a value and unit column; bare `bits/sec` is rescaled to kilobits
    pub fn from_column(value: f64, unit: &str) -> Result<Self, UnitParseError> {
        match unit {
            "bits/sec" => Ok(Self::new(value / MAGNITUDE_STEP, BitrateUnit::KilobitsPerSec)),
            _ => Ok(Self::new(value, unit.parse()?)),
        }
    }

    /// Normalized value in megabits per second
    pub fn megabits_per_sec(&self) -> f64 {
        self.unit.to_megabits_per_sec(self.value)
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
