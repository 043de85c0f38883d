//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! Every stage of the pipeline speaks this type: source bars after
//! normalization, aggregated bars out of the resampler, and the rows of a
//! published panel.

use chrono::{DateTime, Utc};

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// `ts` is the start of the interval the bar covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// The start of the bar interval (UTC).
    pub ts: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,
}

impl Bar {
    /// Creates a bar from its fields.
    pub fn new(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when `high` sits below any of open, close or low.
    pub fn high_violated(&self) -> bool {
        self.high < self.open || self.high < self.close || self.high < self.low
    }

    /// `true` when `low` sits above any of open, close or high.
    pub fn low_violated(&self) -> bool {
        self.low > self.open || self.low > self.close || self.low > self.high
    }

    /// All five numeric fields are finite.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn well_shaped_bar_has_no_violation() {
        let bar = Bar::new(at(0), 10.0, 15.0, 9.0, 11.0, 100.0);
        assert!(!bar.high_violated());
        assert!(!bar.low_violated());
    }

    #[test]
    fn high_below_close_is_flagged() {
        let bar = Bar::new(at(0), 10.0, 10.5, 9.0, 11.0, 100.0);
        assert!(bar.high_violated());
        assert!(!bar.low_violated());
    }

    #[test]
    fn low_above_open_is_flagged() {
        let bar = Bar::new(at(0), 10.0, 15.0, 10.5, 11.0, 100.0);
        assert!(bar.low_violated());
        assert!(!bar.high_violated());
    }

    #[test]
    fn nan_is_not_finite() {
        let bar = Bar::new(at(0), f64::NAN, 15.0, 9.0, 11.0, 100.0);
        assert!(!bar.is_finite());
    }
}
