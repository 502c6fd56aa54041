//! iperf3 text output parsing
//!
//! iperf3 prints one line per reporting interval. Two layouts are accepted:
//!
//! ```text
//! [  5]   0.00-1.00   sec  11.2 MBytes  94.0 Mbits/sec                 (simple, UDP and receiver side)
//! [  5]   0.00-1.00   sec  11.2 MBytes  94.0 Mbits/sec    0    257 KBytes   (extended, TCP sender)
//! ```
//!
//! Each layout has its own matcher that only captures raw fields. Turning the
//! captured text into an [`IntervalRecord`] is a separate fallible step, so a
//! line with a malformed number drops that one record and nothing else. Lines
//! that match neither layout (banners, headers, separators) are skipped.
//!
//! The sender/receiver totals iperf3 prints at the end match the simple layout
//! too. They become records tagged with a [`StreamRole`]; callers that only
//! want per-interval samples use [`OutputParser::parse_intervals`].


use crate::{
    error::Result,
    models::record::{IntervalRecord, TimeInterval},
    units::{Bitrate, Transfer, UnitParseError},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use crate::models::record::StreamRole;

const SIMPLE_PATTERN: &str = concat!(
    r"^\s*(?:\[\s*(?:\d+|SUM)\]\s+)?",
    r"(\S+?)-(\S+)\s+sec\s+",
    r"(\S+)\s+(\w*Bytes)\s+",
    r"(\S+)\s+(\w*bits/sec)",
    r"(.*)$",
);

const EXTENDED_PATTERN: &str = concat!(
    r"^\s*\[\s*(\d+)\]\s+",
    r"(\S+?)-(\S+)\s+sec\s+",
    r"(\S+)\s+(\w*Bytes)\s+",
    r"(\S+)\s+(\w*bits/sec)\s+",
    r"(\S+)\s+(\S+)\s+(\w*Bytes)\s*$",
);

fn role_from_tail(tail: &str) -> Option<StreamRole> {
    match tail.split_whitespace().last() {
        Some("sender") => Some(StreamRole::Sender),
        Some("receiver") => Some(StreamRole::Receiver),
        _ => None,
    }
}

/// Raw interval, transfer and bitrate columns shared by both layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalFields<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub transfer_value: &'a str,
    pub transfer_unit: &'a str,
    pub bitrate_value: &'a str,
    pub bitrate_unit: &'a str,
}

/// Raw fields captured from a line, tagged by layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMatch<'a> {
    SimpleInterval {
        fields: IntervalFields<'a>,
        /// Set on end-of-run total lines
        role: Option<StreamRole>,
    },
    ExtendedInterval {
        fields: IntervalFields<'a>,
        stream_id: &'a str,
        retransmits: &'a str,
        cwnd_value: &'a str,
        cwnd_unit: &'a str,
    },
}

/// Why a matched line did not become a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("field '{field}' is not a non-negative number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("interval {start}-{end} is not ordered")]
    InvalidInterval { start: f64, end: f64 },

    #[error(transparent)]
    UnsupportedUnit(#[from] UnitParseError),
}

/// Matcher for the simple layout
#[derive(Debug, Clone)]
pub struct SimpleLineMatcher {
    pattern: Regex,
}

impl SimpleLineMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self { pattern: Regex::new(SIMPLE_PATTERN)? })
    }

    pub fn match_line<'a>(&self, line: &'a str) -> Option<LineMatch<'a>> {
        let caps = self.pattern.captures(line)?;
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        Some(LineMatch::SimpleInterval {
            fields: IntervalFields {
                start: field(1),
                end: field(2),
                transfer_value: field(3),
                transfer_unit: field(4),
                bitrate_value: field(5),
                bitrate_unit: field(6),
            },
            role: role_from_tail(field(7)),
        })
    }
}

/// Matcher for the extended TCP layout
#[derive(Debug, Clone)]
pub struct ExtendedLineMatcher {
    pattern: Regex,
}

impl ExtendedLineMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self { pattern: Regex::new(EXTENDED_PATTERN)? })
    }

    pub fn match_line<'a>(&self, line: &'a str) -> Option<LineMatch<'a>> {
        let caps = self.pattern.captures(line)?;
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        Some(LineMatch::ExtendedInterval {
            stream_id: field(1),
            fields: IntervalFields {
                start: field(2),
                end: field(3),
                transfer_value: field(4),
                transfer_unit: field(5),
                bitrate_value: field(6),
                bitrate_unit: field(7),
            },
            retransmits: field(8),
            cwnd_value: field(9),
            cwnd_unit: field(10),
        })
    }
}

fn parse_quantity(field: &'static str, raw: &str) -> std::result::Result<f64, RecordError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(RecordError::InvalidNumber { field, value: raw.to_string() }),
    }
}

fn parse_count<T: std::str::FromStr>(field: &'static str, raw: &str) -> std::result::Result<T, RecordError> {
    raw.parse::<T>()
        .map_err(|_| RecordError::InvalidNumber { field, value: raw.to_string() })
}

fn build_base(fields: &IntervalFields<'_>) -> std::result::Result<IntervalRecord, RecordError> {
    let start = parse_quantity("interval start", fields.start)?;
    let end = parse_quantity("interval end", fields.end)?;
    let interval = TimeInterval::new(start, end)
        .ok_or(RecordError::InvalidInterval { start, end })?;

    let transfer = Transfer::from_column(
        parse_quantity("transfer", fields.transfer_value)?,
        fields.transfer_unit,
    )?;
    let bitrate = Bitrate::from_column(
        parse_quantity("bitrate", fields.bitrate_value)?,
        fields.bitrate_unit,
    )?;

    Ok(IntervalRecord::simple(interval, transfer, bitrate))
}

impl TryFrom<LineMatch<'_>> for IntervalRecord {
    type Error = RecordError;

    fn try_from(line: LineMatch<'_>) -> std::result::Result<Self, Self::Error> {
        match line {
            LineMatch::SimpleInterval { fields, role } => Ok(build_base(&fields)?.with_role(role)),
            LineMatch::ExtendedInterval { fields, stream_id, retransmits, cwnd_value, cwnd_unit } => {
                let base = build_base(&fields)?;
                let congestion_window = Transfer::from_column(
                    parse_quantity("cwnd", cwnd_value)?,
                    cwnd_unit,
                )?;
                Ok(base.with_tcp_details(
                    parse_count("stream id", stream_id)?,
                    parse_count("retransmits", retransmits)?,
                    congestion_window,
                ))
            }
        }
    }
}

/// End-of-run total reported by iperf3 for one side of the connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamTotal {
    pub role: StreamRole,
    pub record: IntervalRecord,
}

impl StreamTotal {
    /// `None` for per-interval samples
    pub fn from_record(record: IntervalRecord) -> Option<Self> {
        record.role.map(|role| Self { role, record })
    }
}

/// A matched line that could not be turned into a record
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    /// 1-based line number in the source text
    pub line_number: usize,
    pub reason: RecordError,
}

/// Parse result with the bookkeeping used for debug logging
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    /// Every matched line that converted, totals included
    pub records: Vec<IntervalRecord>,
    pub rejected: Vec<RejectedLine>,
    /// Lines that matched neither layout
    pub skipped_lines: usize,
}

impl ParseReport {
    pub fn matched_lines(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    /// Per-interval samples only
    pub fn intervals(&self) -> impl Iterator<Item = &IntervalRecord> {
        self.records.iter().filter(|r| !r.is_total())
    }

    pub fn totals(&self) -> Vec<StreamTotal> {
        self.records.iter().cloned().filter_map(StreamTotal::from_record).collect()
    }
}

/// Extracts interval records from iperf3 output
#[derive(Debug, Clone)]
pub struct OutputParser {
    simple: SimpleLineMatcher,
    extended: ExtendedLineMatcher,
}

impl OutputParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            simple: SimpleLineMatcher::new()?,
            extended: ExtendedLineMatcher::new()?,
        })
    }

    /// Match one line against the extended layout first, then the simple one
    pub fn match_line<'a>(&self, line: &'a str) -> Option<LineMatch<'a>> {
        self.extended
            .match_line(line)
            .or_else(|| self.simple.match_line(line))
    }

    /// One record per matched line in source order, totals tagged with their role
    pub fn parse(&self, output: &str) -> Vec<IntervalRecord> {
        output
            .lines()
            .filter_map(|line| self.match_line(line))
            .filter_map(|m| IntervalRecord::try_from(m).ok())
            .collect()
    }

    /// Per-interval samples with the end-of-run totals left out
    pub fn parse_intervals(&self, output: &str) -> Vec<IntervalRecord> {
        self.parse(output).into_iter().filter(|r| !r.is_total()).collect()
    }

    /// End-of-run sender/receiver totals in source order
    pub fn parse_totals(&self, output: &str) -> Vec<StreamTotal> {
        self.parse(output).into_iter().filter_map(StreamTotal::from_record).collect()
    }

    /// Full parse keeping track of skipped and rejected lines
    pub fn parse_detailed(&self, output: &str) -> ParseReport {
        let mut report = ParseReport::default();

        for (index, line) in output.lines().enumerate() {
            let Some(matched) = self.match_line(line) else {
                report.skipped_lines += 1;
                continue;
            };

            match IntervalRecord::try_from(matched) {
                Ok(record) => report.records.push(record),
                Err(reason) => report.rejected.push(RejectedLine {
                    line_number: index + 1,
                    reason,
                }),
            }
        }

        report
    }
}
