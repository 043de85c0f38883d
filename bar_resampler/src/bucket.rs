//! bucket.rs — UTC bucket mapping utilities
//!
//! - One stable epoch: Unix (1970-01-01T00:00:00Z).
//! - Fixed-size frames (minute/hour/day): second-based math, so a 2-hour
//!   bucket always starts on an even UTC hour regardless of where the data
//!   begins.
//! - Buckets are half-open: `[start, start + width)`.
//!
//! All functions assume the input timestamp is UTC.

use chrono::{DateTime, Duration, Utc};

use crate::timeframe::Timeframe;

/// Unix epoch start (1970-01-01T00:00:00Z).
pub const EPOCH_UNIX: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Number of seconds in a minute.
pub const SECS_PER_MINUTE: i64 = 60;
/// Number of seconds in an hour.
pub const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
/// Number of seconds in a day.
pub const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Compute the bucket id for a UTC timestamp.
///
/// Ids are signed so instants before the epoch map to negative buckets
/// instead of wrapping.
pub fn bucket_id(ts_utc: DateTime<Utc>, tf: Timeframe) -> i64 {
    // `timestamp()` floors, sub-second parts stay in the same bucket.
    ts_utc.timestamp().div_euclid(tf.seconds())
}

/// Get the UTC start instant for a bucket id.
pub fn bucket_start_utc(id: i64, tf: Timeframe) -> DateTime<Utc> {
    // Use i128 internally to avoid accidental overflow in extreme cases.
    let offset_secs = (id as i128) * (tf.seconds() as i128);
    EPOCH_UNIX + Duration::seconds(offset_secs as i64)
}

/// Exclusive end instant for the bucket (start + width).
pub fn bucket_end_exclusive_utc(id: i64, tf: Timeframe) -> DateTime<Utc> {
    bucket_start_utc(id, tf) + tf.duration()
}

/// Start of the bucket containing `ts_utc`.
pub fn floor_to_bucket(ts_utc: DateTime<Utc>, tf: Timeframe) -> DateTime<Utc> {
    bucket_start_utc(bucket_id(ts_utc, tf), tf)
}

/// Whether `ts_utc` sits exactly on a bucket boundary.
pub fn is_aligned(ts_utc: DateTime<Utc>, tf: Timeframe) -> bool {
    floor_to_bucket(ts_utc, tf) == ts_utc
}
