//! Source ingestion: read one per-instrument CSV and normalize it into a
//! validated [`BarSeries`].
//!
//! The source columns are `timestamp, open, high, low, close, volume` (extra
//! columns are ignored). Normalization renames `timestamp` to the canonical
//! `ts`, converts it to UTC, tags the symbol, sorts by `ts` and removes
//! duplicate rows.

pub mod normalize;
pub mod reader;
pub mod tz;

use std::path::{Path, PathBuf};

use bar_resampler::{
    models::bar_series::{BarSeries, SeriesError},
    timeframe::Timeframe,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use snafu::{Backtrace, Snafu};

pub use normalize::normalize;
pub use reader::{RawBar, read_raw_bars};

/// Errors raised while loading a source file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestError {
    /// The CSV could not be opened or a row could not be decoded.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// The file holds a header but no data rows.
    #[snafu(display("[{symbol}] {} has no rows", path.display()))]
    EmptySource {
        symbol: String,
        path: PathBuf,
        backtrace: Backtrace,
    },

    /// A timestamp cell could not be converted to UTC. `line` is the 1-based
    /// file line, header included.
    #[snafu(display("[{symbol}] bad timestamp in {}:{line}: {source}", path.display()))]
    Timestamp {
        symbol: String,
        path: PathBuf,
        line: usize,
        source: tz::TimestampError,
        backtrace: Backtrace,
    },

    /// Two rows share a timestamp but disagree on values.
    #[snafu(display("[{symbol}] conflicting rows for ts={}", ts.to_rfc3339()))]
    ConflictingDuplicate {
        symbol: String,
        ts: DateTime<Utc>,
        backtrace: Backtrace,
    },

    /// The normalized rows failed series validation.
    #[snafu(display("Normalized rows are not a valid series"))]
    Series {
        #[snafu(backtrace)]
        source: SeriesError,
    },
}

/// Reads and normalizes one source file.
pub fn load_series(
    path: &Path,
    symbol: &str,
    timeframe: Timeframe,
    tz: Tz,
) -> Result<BarSeries, IngestError> {
    let raw = read_raw_bars(path)?;
    normalize(raw, symbol, timeframe, tz, path)
}
