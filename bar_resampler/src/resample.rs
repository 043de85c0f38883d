//! Fixed-width resampling of an ordered bar series into coarser buckets.
//!
//! Buckets come from [`crate::bucket`], so their boundaries depend only on
//! wall-clock UTC time. A single pass folds consecutive bars sharing a bucket:
//! first open, max high, min low, last close, and a volume sum accumulated
//! first-to-last. Buckets without source bars are skipped, not zero-filled.

use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

use crate::{
    bucket::{bucket_id, bucket_start_utc},
    models::{
        bar::Bar,
        bar_series::{BarSeries, SeriesError},
    },
    timeframe::Timeframe,
};

/// Errors returned by [`resample`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResampleError {
    /// The bucket is not a whole multiple of the source timeframe.
    #[snafu(display(
        "[{symbol}] cannot resample {source_tf} bars into {bucket}: bucket must be a whole multiple"
    ))]
    IncompatibleTimeframes {
        /// Series symbol.
        symbol: String,
        /// Width of the source bars.
        source_tf: Timeframe,
        /// Requested bucket width.
        bucket: Timeframe,
        /// Where the error was raised.
        backtrace: Backtrace,
    },

    /// The aggregated bars failed series validation.
    #[snafu(display("Resampled output is not a valid series"))]
    InvalidOutput {
        /// The validation failure.
        #[snafu(backtrace)]
        source: SeriesError,
    },
}

/// Number of source bars that can fall into one bucket (`bucket / source`).
pub fn max_bars_per_bucket(source: Timeframe, bucket: Timeframe) -> Option<u32> {
    bucket.ratio_to(source)
}

/// Resamples `series` into `bucket`-wide bars.
///
/// The output keeps the symbol, carries `bucket` as its timeframe and is
/// ordered by bucket start. Identical input always yields a bit-identical
/// output.
pub fn resample(series: &BarSeries, bucket: Timeframe) -> Result<BarSeries, ResampleError> {
    let per_bucket = max_bars_per_bucket(series.timeframe(), bucket).context(
        IncompatibleTimeframesSnafu {
            symbol: series.symbol(),
            source_tf: series.timeframe(),
            bucket,
        },
    )?;

    let mut out: Vec<Bar> = Vec::with_capacity(series.len() / per_bucket as usize + 1);
    let mut current: Option<(i64, Bar)> = None;

    for bar in series.bars() {
        let id = bucket_id(bar.ts, bucket);
        match current.as_mut() {
            Some((open_id, agg)) if *open_id == id => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                if let Some((_, done)) = current.take() {
                    out.push(done);
                }
                let start = Bar {
                    ts: bucket_start_utc(id, bucket),
                    ..*bar
                };
                current = Some((id, start));
            }
        }
    }
    if let Some((_, done)) = current {
        out.push(done);
    }

    tracing::debug!(
        symbol = series.symbol(),
        source_rows = series.len(),
        bucket_rows = out.len(),
        %bucket,
        "resampled series"
    );

    BarSeries::new(series.symbol(), bucket, out).context(InvalidOutputSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, 0, 0).unwrap()
    }

    fn tf(s: &str) -> Timeframe {
        s.parse().unwrap()
    }

    fn four_bars() -> BarSeries {
        let bars = (0..4)
            .map(|i| {
                let f = i as f64;
                Bar::new(
                    at(i),
                    10.0 + f,
                    15.0 + f,
                    9.0 + f,
                    11.0 + f,
                    100.0 * (f + 1.0),
                )
            })
            .collect();
        BarSeries::new("XAUUSD_BID", tf("1h"), bars).unwrap()
    }

    #[test]
    fn four_hourly_bars_fold_into_two_buckets() {
        let out = resample(&four_bars(), tf("2h")).unwrap();
        assert_eq!(out.symbol(), "XAUUSD_BID");
        assert_eq!(out.timeframe(), tf("2h"));
        assert_eq!(
            out.bars(),
            &[
                Bar::new(at(0), 10.0, 16.0, 9.0, 12.0, 300.0),
                Bar::new(at(2), 12.0, 18.0, 11.0, 14.0, 700.0),
            ]
        );
    }

    #[test]
    fn lone_odd_hour_lands_in_even_bucket() {
        let series =
            BarSeries::new("X", tf("1h"), vec![Bar::new(at(5), 1.0, 2.0, 0.5, 1.5, 7.0)]).unwrap();
        let out = resample(&series, tf("2h")).unwrap();
        assert_eq!(out.bars(), &[Bar::new(at(4), 1.0, 2.0, 0.5, 1.5, 7.0)]);
    }

    #[test]
    fn empty_buckets_are_skipped() {
        let bars = vec![
            Bar::new(at(0), 1.0, 2.0, 0.5, 1.5, 1.0),
            Bar::new(at(7), 3.0, 4.0, 2.5, 3.5, 2.0),
        ];
        let series = BarSeries::new("X", tf("1h"), bars).unwrap();
        let out = resample(&series, tf("2h")).unwrap();
        let starts: Vec<_> = out.bars().iter().map(|b| b.ts).collect();
        assert_eq!(starts, vec![at(0), at(6)]);
    }

    #[test]
    fn identity_when_widths_match() {
        let series = four_bars();
        let out = resample(&series, tf("1h")).unwrap();
        assert_eq!(out.bars(), series.bars());
    }

    #[test]
    fn rejects_non_multiple_bucket() {
        let err = resample(&four_bars(), tf("90m")).unwrap_err();
        assert!(matches!(err, ResampleError::IncompatibleTimeframes { .. }));
        let err = resample(&four_bars(), tf("30m")).unwrap_err();
        assert!(matches!(err, ResampleError::IncompatibleTimeframes { .. }));
    }
}
