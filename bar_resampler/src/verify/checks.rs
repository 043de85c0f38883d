//! The individual audit checks. Each one is a pure function returning its own
//! findings; [`super::verify`] concatenates them in order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::finding::{Field, Finding};
use crate::{bucket::floor_to_bucket, models::bar::Bar, timeframe::Timeframe};

/// Upper bound on fence-post findings before a [`Finding::Truncated`] marker.
pub const MAX_FENCE_POST_FINDINGS: usize = 20;

pub(crate) fn row_count(aggregated: &[Bar], oracle: &[Bar]) -> Vec<Finding> {
    if aggregated.len() == oracle.len() {
        return vec![];
    }
    vec![Finding::RowCount {
        resampled: aggregated.len(),
        oracle: oracle.len(),
    }]
}

pub(crate) fn timestamps(aggregated: &[Bar], oracle: &[Bar]) -> Vec<Finding> {
    let paired = aggregated
        .iter()
        .zip(oracle)
        .filter(|(a, o)| a.ts != o.ts)
        .count();
    let unmatched = aggregated.len().abs_diff(oracle.len());
    match paired + unmatched {
        0 => vec![],
        count => vec![Finding::TimestampMismatch { count }],
    }
}

pub(crate) fn field_identity(aggregated: &[Bar], oracle: &[Bar]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for field in Field::ALL {
        if aggregated.len() != oracle.len() {
            findings.push(Finding::FieldLength {
                field,
                resampled: aggregated.len(),
                oracle: oracle.len(),
            });
            continue;
        }

        // Exact comparison on purpose: both paths must produce the same bits.
        let mut diffs = aggregated
            .iter()
            .zip(oracle)
            .enumerate()
            .filter(|(_, (a, o))| field.get(a) != field.get(o));
        let Some((first_index, (actual, expected))) = diffs.next() else {
            continue;
        };
        findings.push(Finding::FieldMismatch {
            field,
            count: 1 + diffs.count(),
            first_index,
            ts: actual.ts,
            actual: field.get(actual),
            expected: field.get(expected),
        });
    }
    findings
}

pub(crate) fn left_boundary(source: &[Bar], aggregated: &[Bar], bucket: Timeframe) -> Vec<Finding> {
    let (Some(first_source), Some(first_bucket)) = (source.first(), aggregated.first()) else {
        return vec![];
    };
    if first_bucket.ts < floor_to_bucket(first_source.ts, bucket) {
        return vec![Finding::StartsBeforeSource {
            first_bucket: first_bucket.ts,
            first_source: first_source.ts,
        }];
    }
    vec![]
}

pub(crate) fn ohlc_shape(aggregated: &[Bar]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let bad_high = aggregated.iter().filter(|b| b.high_violated()).count();
    if bad_high > 0 {
        findings.push(Finding::HighBelowOhlc { count: bad_high });
    }
    let bad_low = aggregated.iter().filter(|b| b.low_violated()).count();
    if bad_low > 0 {
        findings.push(Finding::LowAboveOhlc { count: bad_low });
    }
    findings
}

pub(crate) fn volume_conservation(
    expected: &BTreeMap<DateTime<Utc>, f64>,
    aggregated: &[Bar],
) -> Vec<Finding> {
    let count = aggregated
        .iter()
        .filter_map(|bar| expected.get(&bar.ts).map(|total| (total - bar.volume).abs()))
        .filter(|diff| *diff > 0.0)
        .count();
    if count == 0 {
        return vec![];
    }
    vec![Finding::VolumeNotConserved { count }]
}

pub(crate) fn fence_post(
    source: &[Bar],
    aggregated: &[Bar],
    bucket: Timeframe,
    max: u32,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let width = bucket.duration();

    for (i, bar) in aggregated.iter().enumerate() {
        let start = bar.ts;
        let end = start + width;
        // `source` is sorted, so the window is a contiguous slice.
        let lo = source.partition_point(|b| b.ts < start);
        let hi = source.partition_point(|b| b.ts < end);
        let n_source = hi - lo;
        if (1..=max as usize).contains(&n_source) {
            continue;
        }
        findings.push(Finding::FencePost {
            bucket_start: start,
            n_source,
            max,
        });
        if findings.len() == MAX_FENCE_POST_FINDINGS {
            if i + 1 < aggregated.len() {
                findings.push(Finding::Truncated);
            }
            break;
        }
    }
    findings
}
