//! Source timestamp parsing and conversion to UTC.
//!
//! What this module provides:
//! - [`parse_ts_to_utc`]: RFC-3339 timestamps with an explicit offset -> UTC.
//! - [`from_local_naive_tz`]: naive wall-clock time in an IANA zone -> UTC, erroring on
//!   DST gaps (spring-forward) and ambiguous times (fall-back).
//! - [`parse_source_timestamp`]: the cell-level entrypoint used by ingestion; accepts
//!   offset timestamps, naive timestamps (interpreted in the configured zone), and
//!   integer Unix epochs in seconds or milliseconds.
//!
//! Notes:
//! - All bucket math downstream is UTC; local time only exists at this edge and must
//!   resolve deterministically or error.
//!
//! Examples
//! - "2024-03-10T09:30:00-05:00" -> 2024-03-10T14:30:00Z
//! - "2024-03-10 14:30:00" with zone UTC -> 2024-03-10T14:30:00Z
//! - "1710081000000" -> 2024-03-10T14:30:00Z

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use snafu::Snafu;

/// Epoch values with at least this many digits are read as milliseconds.
const MILLIS_MIN_DIGITS: usize = 13;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Why a timestamp cell could not be turned into a UTC instant.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum TimestampError {
    #[snafu(display("unrecognized timestamp {value:?}"))]
    Unrecognized { value: String },

    #[snafu(display("epoch value {value} is out of range"))]
    OutOfRange { value: i64 },

    #[snafu(display("local time {naive} is ambiguous in {tz}"))]
    Ambiguous { naive: NaiveDateTime, tz: Tz },

    #[snafu(display("local time {naive} does not exist in {tz}"))]
    Nonexistent { naive: NaiveDateTime, tz: Tz },
}

/// RFC-3339 with offset -> UTC. Also accepts a space instead of `T`.
pub fn parse_ts_to_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a naive local timestamp to UTC in `tz`, strict on DST edge cases.
pub fn from_local_naive_tz(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TimestampError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) => AmbiguousSnafu { naive, tz }.fail(),
        LocalResult::None => NonexistentSnafu { naive, tz }.fail(),
    }
}

fn from_epoch(digits: &str) -> Option<Result<DateTime<Utc>, TimestampError>> {
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let Ok(value) = digits.parse::<i64>() else {
        return Some(OutOfRangeSnafu { value: i64::MAX }.fail());
    };
    let parsed = if unsigned.len() >= MILLIS_MIN_DIGITS {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    };
    Some(parsed.ok_or(TimestampError::OutOfRange { value }))
}

/// Parse one source timestamp cell.
///
/// Tried in order: integer epoch (seconds, or milliseconds at 13+ digits),
/// RFC-3339 with offset, then naive formats interpreted in `tz`.
pub fn parse_source_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();
    if let Some(res) = from_epoch(s) {
        return res;
    }
    if let Some(dt) = parse_ts_to_utc(s) {
        return Ok(dt);
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return from_local_naive_tz(naive, tz);
        }
    }
    UnrecognizedSnafu { value: s }.fail()
}
