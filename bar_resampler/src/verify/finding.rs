//! Diagnostics produced by the oracle audit.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::{models::bar::Bar, timeframe::Timeframe};

/// One of the five numeric bar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// `open`
    Open,
    /// `high`
    High,
    /// `low`
    Low,
    /// `close`
    Close,
    /// `volume`
    Volume,
}

impl Field {
    /// All fields, in column order.
    pub const ALL: [Field; 5] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
    ];

    /// Reads this field from a bar.
    pub fn get(self, bar: &Bar) -> f64 {
        match self {
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
            Field::Volume => bar.volume,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
        })
    }
}

/// A single violated expectation. Field meanings follow the [`fmt::Display`]
/// text of each variant.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Finding {
    /// Source and aggregated series disagree on the symbol.
    SymbolMismatch {
        source: String,
        aggregated: String,
    },
    /// The aggregated timeframe is not a whole multiple of the source one,
    /// so no oracle could be computed.
    IncompatibleTimeframes {
        source: Timeframe,
        bucket: Timeframe,
    },
    /// The oracle itself could not be computed.
    OracleFailed { message: String },
    /// Different number of rows than the oracle.
    RowCount {
        resampled: usize,
        oracle: usize,
    },
    /// Bucket timestamps differ from the oracle's.
    TimestampMismatch { count: usize },
    /// A field column has a different length than the oracle's.
    FieldLength {
        field: Field,
        resampled: usize,
        oracle: usize,
    },
    /// A field column differs from the oracle under exact comparison.
    FieldMismatch {
        field: Field,
        count: usize,
        first_index: usize,
        ts: DateTime<Utc>,
        actual: f64,
        expected: f64,
    },
    /// The first bucket precedes the bucket holding the first source bar.
    StartsBeforeSource {
        first_bucket: DateTime<Utc>,
        first_source: DateTime<Utc>,
    },
    /// Bars whose high is below open, close or low.
    HighBelowOhlc { count: usize },
    /// Bars whose low is above open, close or high.
    LowAboveOhlc { count: usize },
    /// Buckets whose volume differs from the independently summed volume.
    VolumeNotConserved { count: usize },
    /// A bucket holds too few or too many source bars.
    FencePost {
        bucket_start: DateTime<Utc>,
        n_source: usize,
        max: u32,
    },
    /// Further fence-post findings were dropped.
    Truncated,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::SymbolMismatch { source, aggregated } => {
                write!(f, "symbol mismatch: source={source}, aggregated={aggregated}")
            }
            Finding::IncompatibleTimeframes { source, bucket } => write!(
                f,
                "bucket {bucket} is not a whole multiple of source {source}, no oracle"
            ),
            Finding::OracleFailed { message } => write!(f, "oracle recomputation failed: {message}"),
            Finding::RowCount { resampled, oracle } => write!(
                f,
                "Row count mismatch: resampled={resampled}, oracle={oracle}"
            ),
            Finding::TimestampMismatch { count } => write!(f, "{count} timestamp mismatches"),
            Finding::FieldLength {
                field,
                resampled,
                oracle,
            } => write!(f, "{field}: length mismatch {resampled} vs {oracle}"),
            Finding::FieldMismatch {
                field,
                count,
                first_index,
                ts,
                actual,
                expected,
            } => write!(
                f,
                "{field}: {count} mismatches. First at idx={first_index}, ts={}, got={actual}, expected={expected}",
                ts.to_rfc3339()
            ),
            Finding::StartsBeforeSource {
                first_bucket,
                first_source,
            } => write!(
                f,
                "aggregated series starts before source: {} < bucket of {}",
                first_bucket.to_rfc3339(),
                first_source.to_rfc3339()
            ),
            Finding::HighBelowOhlc { count } => {
                write!(f, "{count} bars where high < other OHLC fields")
            }
            Finding::LowAboveOhlc { count } => {
                write!(f, "{count} bars where low > other OHLC fields")
            }
            Finding::VolumeNotConserved { count } => {
                write!(f, "{count} bars with volume conservation violation")
            }
            Finding::FencePost {
                bucket_start,
                n_source,
                max,
            } => write!(
                f,
                "bar at {} has {n_source} source bars (expected 1-{max})",
                bucket_start.to_rfc3339()
            ),
            Finding::Truncated => f.write_str("... truncated, too many errors"),
        }
    }
}
