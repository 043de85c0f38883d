//! Resample-and-verify core for OHLCV bar series.
//!
//! - [`resample::resample`] folds an ordered series into fixed-width,
//!   epoch-aligned UTC buckets.
//! - [`verify::verify`] recomputes the same aggregation through an independent
//!   path and audits the resampled series against it.
//!
//! ```
//! use bar_resampler::models::{bar::Bar, bar_series::BarSeries};
//! use bar_resampler::{resample::resample, verify::verify};
//! use chrono::{TimeZone, Utc};
//!
//! let bars = (0..4)
//!     .map(|h| Bar::new(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap(), 1.0, 2.0, 0.5, 1.5, 10.0))
//!     .collect();
//! let hourly = BarSeries::new("XAUUSD_BID", "1h".parse().unwrap(), bars).unwrap();
//! let two_hourly = resample(&hourly, "2h".parse().unwrap()).unwrap();
//! assert_eq!(two_hourly.len(), 2);
//! assert!(verify(&hourly, &two_hourly).is_pass());
//! ```

#![warn(missing_docs)]

pub mod bucket;
pub mod models;
pub mod resample;
pub mod timeframe;
pub mod verify;
