//! Raw rows -> validated [`BarSeries`].

use std::path::Path;

use bar_resampler::{
    models::{bar::Bar, bar_series::BarSeries},
    timeframe::Timeframe,
};
use chrono_tz::Tz;
use snafu::{ResultExt, ensure};

use super::{
    ConflictingDuplicateSnafu, EmptySourceSnafu, IngestError, RawBar, SeriesSnafu, TimestampSnafu,
    tz::parse_source_timestamp,
};

/// Data rows start on line 2, after the header.
const FIRST_DATA_LINE: usize = 2;

/// Converts raw rows into a series for `symbol`.
///
/// Timestamps are parsed into UTC, rows are stably sorted by `ts`, and rows
/// that repeat a timestamp are collapsed when every value matches. A repeated
/// timestamp with different values is an error.
pub fn normalize(
    raw: Vec<RawBar>,
    symbol: &str,
    timeframe: Timeframe,
    tz: Tz,
    path: &Path,
) -> Result<BarSeries, IngestError> {
    ensure!(!raw.is_empty(), EmptySourceSnafu { symbol, path });

    let mut bars = raw
        .into_iter()
        .enumerate()
        .map(|(index, r)| {
            let line = index + FIRST_DATA_LINE;
            let ts = parse_source_timestamp(&r.timestamp, tz)
                .context(TimestampSnafu { symbol, path, line })?;
            Ok(Bar::new(ts, r.open, r.high, r.low, r.close, r.volume))
        })
        .collect::<Result<Vec<_>, IngestError>>()?;

    bars.sort_by_key(|b| b.ts);

    let before = bars.len();
    let mut deduped: Vec<Bar> = Vec::with_capacity(before);
    for bar in bars {
        match deduped.last() {
            Some(prev) if prev.ts == bar.ts => {
                ensure!(*prev == bar, ConflictingDuplicateSnafu { symbol, ts: bar.ts });
            }
            _ => deduped.push(bar),
        }
    }
    if deduped.len() < before {
        tracing::warn!(
            symbol,
            dropped = before - deduped.len(),
            "Dropped duplicate source rows"
        );
    }

    BarSeries::new(symbol, timeframe, deduped).context(SeriesSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(ts: &str, close: f64) -> RawBar {
        RawBar {
            timestamp: ts.to_string(),
            open: 1.0,
            high: 3.0,
            low: 0.5,
            close,
            volume: 10.0,
        }
    }

    fn h1() -> Timeframe {
        "1h".parse().unwrap()
    }

    #[test]
    fn sorts_and_tags_symbol() {
        let rows = vec![
            raw("2024-01-01T02:00:00Z", 2.0),
            raw("2024-01-01T00:00:00Z", 1.0),
            raw("1704070800", 1.5),
        ];
        let series = normalize(rows, "XAUUSD_BID", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap();
        assert_eq!(series.symbol(), "XAUUSD_BID");
        let hours: Vec<_> = series.bars().iter().map(|b| b.ts).collect();
        assert_eq!(
            hours,
            (0..3)
                .map(|h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap())
                .collect::<Vec<_>>()
        );
        assert_eq!(series.bars()[1].close, 1.5);
    }

    #[test]
    fn identical_duplicates_collapse() {
        let rows = vec![
            raw("2024-01-01T00:00:00Z", 1.0),
            raw("2024-01-01 00:00:00", 1.0),
            raw("2024-01-01T01:00:00Z", 1.0),
        ];
        let series = normalize(rows, "X", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn conflicting_duplicates_fail() {
        let rows = vec![raw("2024-01-01T00:00:00Z", 1.0), raw("1704067200", 1.25)];
        let err = normalize(rows, "X", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, IngestError::ConflictingDuplicate { .. }));
        assert_eq!(err.to_string(), "[X] conflicting rows for ts=2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn bad_timestamp_reports_file_line() {
        let rows = vec![raw("2024-01-01T00:00:00Z", 1.0), raw("soon", 1.0)];
        let err = normalize(rows, "X", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Timestamp { line: 3, .. }), "{err}");
        assert!(err.to_string().starts_with("[X] bad timestamp in x.csv:3: "), "{err}");
    }

    #[test]
    fn empty_and_non_finite_rejected() {
        let err = normalize(Vec::new(), "X", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, IngestError::EmptySource { .. }));

        let mut bad = raw("2024-01-01T00:00:00Z", 1.0);
        bad.volume = f64::NAN;
        let err = normalize(vec![bad], "X", h1(), chrono_tz::UTC, Path::new("x.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Series { .. }));
    }
}
