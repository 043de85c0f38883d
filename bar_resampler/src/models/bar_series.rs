//! A collection of time-series bars for a specific symbol and timeframe.

use chrono::{DateTime, Utc};
use snafu::{Backtrace, Snafu, ensure};

use crate::{models::bar::Bar, timeframe::Timeframe};

/// Reasons a bar sequence cannot form a [`BarSeries`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SeriesError {
    /// The symbol is empty after trimming.
    #[snafu(display("Series symbol must not be empty"))]
    EmptySymbol {
        /// Where the error was raised.
        backtrace: Backtrace,
    },

    /// No bars were supplied.
    #[snafu(display("[{symbol}] series has no bars"))]
    NoBars {
        /// Series symbol.
        symbol: String,
        /// Where the error was raised.
        backtrace: Backtrace,
    },

    /// Timestamps are not strictly increasing.
    #[snafu(display(
        "[{symbol}] bars not strictly increasing at idx={index}: {previous} then {current}"
    ))]
    Unordered {
        /// Series symbol.
        symbol: String,
        /// Position of the offending bar.
        index: usize,
        /// Timestamp of the bar before it.
        previous: DateTime<Utc>,
        /// Timestamp of the offending bar.
        current: DateTime<Utc>,
        /// Where the error was raised.
        backtrace: Backtrace,
    },

    /// A bar carries NaN or an infinity.
    #[snafu(display("[{symbol}] bar at idx={index}, ts={ts} has a non-finite field"))]
    NonFinite {
        /// Series symbol.
        symbol: String,
        /// Position of the offending bar.
        index: usize,
        /// Timestamp of the offending bar.
        ts: DateTime<Utc>,
        /// Where the error was raised.
        backtrace: Backtrace,
    },

    /// A bar reports negative volume.
    #[snafu(display("[{symbol}] bar at idx={index}, ts={ts} has negative volume {volume}"))]
    NegativeVolume {
        /// Series symbol.
        symbol: String,
        /// Position of the offending bar.
        index: usize,
        /// Timestamp of the offending bar.
        ts: DateTime<Utc>,
        /// The rejected volume.
        volume: f64,
        /// Where the error was raised.
        backtrace: Backtrace,
    },
}

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Timeframe`], making the data set self-describing. It can only be
/// built through [`BarSeries::new`], so every instance is non-empty, strictly
/// increasing by `ts`, free of non-finite values and of negative volume.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validates and wraps an ordered bar sequence.
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into().trim().to_string();
        ensure!(!symbol.is_empty(), EmptySymbolSnafu);
        ensure!(!bars.is_empty(), NoBarsSnafu { symbol: &symbol });

        for (index, bar) in bars.iter().enumerate() {
            ensure!(
                bar.is_finite(),
                NonFiniteSnafu {
                    symbol: &symbol,
                    index,
                    ts: bar.ts,
                }
            );
            ensure!(
                bar.volume >= 0.0,
                NegativeVolumeSnafu {
                    symbol: &symbol,
                    index,
                    ts: bar.ts,
                    volume: bar.volume,
                }
            );
            if index > 0 {
                let previous = bars[index - 1].ts;
                ensure!(
                    previous < bar.ts,
                    UnorderedSnafu {
                        symbol: &symbol,
                        index,
                        previous,
                        current: bar.ts,
                    }
                );
            }
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    /// The symbol this data represents (e.g., "XAUUSD_BID").
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The time interval for each bar in the series.
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// The ordered bars.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Number of bars (always at least one).
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// First and last timestamp of the series.
    pub fn span(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        // Non-empty by construction.
        let first = self.bars[0].ts;
        let last = self.bars[self.bars.len() - 1].ts;
        (first, last)
    }

    /// Consumes the series, returning `(symbol, timeframe, bars)`.
    pub fn into_parts(self) -> (String, Timeframe, Vec<Bar>) {
        (self.symbol, self.timeframe, self.bars)
    }
}
