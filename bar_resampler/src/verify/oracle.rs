//! Second, independent aggregation path used as ground truth.
//!
//! Unlike [`crate::resample::resample`] this groups bars into a map keyed by
//! the truncated timestamp (the remainder of the epoch seconds is subtracted
//! from each `ts`, no bucket ids involved) and reduces each group afterwards.
//! Both paths must agree bit for bit.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use thiserror::Error;

use crate::{models::bar::Bar, timeframe::Timeframe};

/// The bucket start for a timestamp falls outside chrono's range.
#[derive(Debug, Error)]
#[error("bucket start for {0} is out of range")]
pub(crate) struct BucketOutOfRange(DateTime<Utc>);

/// Start of the `width_secs` window holding `ts`.
fn truncate(ts: DateTime<Utc>, width_secs: i64) -> Result<DateTime<Utc>, BucketOutOfRange> {
    let rem = ts.timestamp().rem_euclid(width_secs);
    ts.with_nanosecond(0)
        .and_then(|whole| whole.checked_sub_signed(TimeDelta::seconds(rem)))
        .ok_or(BucketOutOfRange(ts))
}

/// Recomputes the aggregated bars for `bars` at `bucket` width.
pub(crate) fn recompute(bars: &[Bar], bucket: Timeframe) -> Result<Vec<Bar>, BucketOutOfRange> {
    let mut groups: BTreeMap<DateTime<Utc>, Vec<&Bar>> = BTreeMap::new();
    for bar in bars {
        let start = truncate(bar.ts, bucket.seconds())?;
        groups.entry(start).or_default().push(bar);
    }

    Ok(groups
        .into_iter()
        .filter_map(|(start, members)| reduce(start, &members))
        .collect())
}

fn reduce(start: DateTime<Utc>, members: &[&Bar]) -> Option<Bar> {
    let first = members.first()?;
    let last = members.last()?;
    Some(Bar {
        ts: start,
        open: first.open,
        high: members.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
        low: members.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
        close: last.close,
        volume: members.iter().fold(0.0, |acc, b| acc + b.volume),
    })
}

/// Per-bucket volume totals, summed first-to-last, keyed by bucket start.
pub(crate) fn bucket_volumes(
    bars: &[Bar],
    bucket: Timeframe,
) -> Result<BTreeMap<DateTime<Utc>, f64>, BucketOutOfRange> {
    let mut totals = BTreeMap::new();
    for bar in bars {
        *totals
            .entry(truncate(bar.ts, bucket.seconds())?)
            .or_insert(0.0) += bar.volume;
    }
    Ok(totals)
}
