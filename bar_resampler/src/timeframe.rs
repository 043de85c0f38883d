//! Fixed-width bar intervals.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`] (minute,
//! hour or day, all UTC). Every timeframe here has a constant width in seconds,
//! which is what the bucket math in [`crate::bucket`] relies on.
//!
//! Typical usage:
//! ```
//! use std::num::NonZeroU32;
//! use bar_resampler::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "2h".parse().unwrap();
//! assert_eq!(tf, Timeframe::new(NonZeroU32::new(2).unwrap(), TimeframeUnit::Hour));
//! assert_eq!(tf.seconds(), 7_200);
//! assert_eq!(tf.to_string(), "2h");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bucket::{SECS_PER_DAY, SECS_PER_HOUR, SECS_PER_MINUTE};

/// Errors raised while parsing or combining timeframes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    /// The textual form could not be parsed (e.g. `""`, `"h"`, `"0h"`, `"5x"`).
    #[error("Invalid timeframe {input:?}: {message}")]
    InvalidInput {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        message: String,
    },
}

/// Timeframe granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeframeUnit {
    /// UTC minute
    Minute,
    /// UTC hour
    Hour,
    /// UTC day
    Day,
}

impl TimeframeUnit {
    const fn seconds(self) -> i64 {
        match self {
            TimeframeUnit::Minute => SECS_PER_MINUTE,
            TimeframeUnit::Hour => SECS_PER_HOUR,
            TimeframeUnit::Day => SECS_PER_DAY,
        }
    }
}

/// A timeframe = amount × unit (e.g., 15-Minute, 1-Hour, 2-Hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    amount: NonZeroU32,
    unit: TimeframeUnit,
}

impl Timeframe {
    /// Create a new timeframe.
    pub const fn new(amount: NonZeroU32, unit: TimeframeUnit) -> Self {
        Self { amount, unit }
    }

    /// Number of units per bar.
    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    /// Unit of the timeframe.
    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    /// Width of one bar in seconds.
    pub const fn seconds(&self) -> i64 {
        self.unit.seconds() * self.amount.get() as i64
    }

    /// Width of one bar as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// How many bars of `finer` fit into one bar of `self`.
    ///
    /// Returns `None` unless `self` is a whole multiple of `finer`.
    pub fn ratio_to(&self, finer: Timeframe) -> Option<u32> {
        let (coarse, fine) = (self.seconds(), finer.seconds());
        if coarse < fine || coarse % fine != 0 {
            return None;
        }
        u32::try_from(coarse / fine).ok()
    }
}

/// Display/parse for config and CLI ergonomics (`"15m"`, `"1h"`, `"1D"`)
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeframeUnit::Minute => "m",
            TimeframeUnit::Hour => "h",
            TimeframeUnit::Day => "D",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| TimeframeError::InvalidInput {
            input: s.to_string(),
            message: message.to_string(),
        };

        let s = s.trim();
        let Some(unit_char) = s.chars().last() else {
            return Err(invalid("empty timeframe"));
        };
        let (digits, unit) = s.split_at(s.len() - unit_char.len_utf8());
        let amount_num: u32 = digits
            .parse()
            .map_err(|_| invalid("amount must be a positive integer"))?;
        let amount = NonZeroU32::new(amount_num).ok_or_else(|| invalid("amount must be > 0"))?;
        let unit = match unit {
            "m" => TimeframeUnit::Minute,
            "h" | "H" => TimeframeUnit::Hour,
            "d" | "D" => TimeframeUnit::Day,
            _ => return Err(invalid("unknown unit, expected one of m, h, D")),
        };
        Ok(Timeframe::new(amount, unit))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}
