//! Parsing of the date/timestamp strings carried by event rows.
//!
//! A string of exactly ten characters with hyphens at offsets 4 and 7 is read
//! as a calendar date; everything else as an instant. The length rule is a
//! heuristic: a ten-character value that is not a real date fails instead of
//! falling through to the instant parser.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::fmt;
use thiserror::Error;

/// Offset-less layouts, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Date(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Timestamp::Instant(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("empty value")]
    Empty,

    #[error("not a calendar date: {0:?}")]
    InvalidDate(String),

    #[error("not a timestamp: {0:?}")]
    InvalidTimestamp(String),
}

pub fn parse_timestamp(raw: &str) -> Result<Timestamp, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }

    if looks_like_date(raw) {
        return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Timestamp::Date)
            .map_err(|_| TimestampError::InvalidDate(raw.to_string()));
    }

    parse_instant(raw)
        .map(Timestamp::Instant)
        .ok_or_else(|| TimestampError::InvalidTimestamp(raw.to_string()))
}

/// Parse an optional column value, substituting `None` on failure.
///
/// Absent and empty values are `None` without a warning; anything unparseable
/// logs a warning naming `field` and `event_id`.
pub fn parse_column(raw: Option<&str>, field: &str, event_id: &str) -> Option<Timestamp> {
    match parse_timestamp(raw?) {
        Ok(ts) => Some(ts),
        Err(TimestampError::Empty) => None,
        Err(e) => {
            tracing::warn!("Event {}: could not parse {} ({}), storing NULL", event_id, field, e);
            None
        }
    }
}

fn looks_like_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-'
}

fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z").ok())
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|naive| naive.and_utc().fixed_offset())
        })
}
