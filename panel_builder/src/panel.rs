//! Multi-symbol panels: the concatenation of several [`BarSeries`] sorted by
//! `(symbol, ts)`.

use std::{fmt, path::PathBuf};

use bar_resampler::{
    models::{bar::Bar, bar_series::BarSeries},
    timeframe::Timeframe,
};
use chrono::{DateTime, Utc};
use snafu::{Backtrace, Snafu, ensure};

/// A panel failed one of its integrity checks.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PanelIntegrityError {
    /// Series of different widths were offered to one panel.
    #[snafu(display("[{symbol}] is {found} bars but the panel is {expected}"))]
    MixedTimeframes {
        symbol: String,
        expected: Timeframe,
        found: Timeframe,
        backtrace: Backtrace,
    },

    /// Some `(ts, symbol)` keys occur more than once.
    #[snafu(display(
        "{timeframe} panel has {count} duplicate (ts, symbol) rows, first [{symbol}] ts={}",
        ts.to_rfc3339()
    ))]
    DuplicateKeys {
        timeframe: Timeframe,
        count: usize,
        symbol: String,
        ts: DateTime<Utc>,
        backtrace: Backtrace,
    },

    /// A written `ts` column holds values that are not UTC.
    #[snafu(display("{} has {count} non-UTC ts values, first {first:?}", path.display()))]
    NonUtcTimestamps {
        path: PathBuf,
        count: usize,
        first: String,
        backtrace: Backtrace,
    },
}

/// One panel row.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub symbol: String,
    pub bar: Bar,
}

/// Sorted, duplicate-free rows of one timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    timeframe: Timeframe,
    rows: Vec<PanelRow>,
}

/// Row count and time coverage of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSummary {
    pub timeframe: Timeframe,
    pub rows: usize,
    pub symbols: usize,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl fmt::Display for PanelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows, {} symbols", self.rows, self.symbols)?;
        if let (Some(first), Some(last)) = (self.first, self.last) {
            write!(f, ", {} .. {}", first.to_rfc3339(), last.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Number of rows whose `(symbol, ts)` key also appears on another row.
///
/// `rows` must be sorted by `(symbol, ts)`.
pub fn duplicate_rows(rows: &[PanelRow]) -> usize {
    rows.chunk_by(|a, b| a.symbol == b.symbol && a.bar.ts == b.bar.ts)
        .filter(|group| group.len() > 1)
        .map(<[PanelRow]>::len)
        .sum()
}

impl Panel {
    /// Concatenates `series` into a panel sorted by `(symbol, ts)`.
    ///
    /// Fails when a series has another timeframe or when any `(ts, symbol)`
    /// key repeats.
    pub fn assemble(
        timeframe: Timeframe,
        series: impl IntoIterator<Item = BarSeries>,
    ) -> Result<Self, PanelIntegrityError> {
        let mut rows = Vec::new();
        for s in series {
            ensure!(
                s.timeframe() == timeframe,
                MixedTimeframesSnafu {
                    symbol: s.symbol(),
                    expected: timeframe,
                    found: s.timeframe(),
                }
            );
            let (symbol, _, bars) = s.into_parts();
            rows.extend(bars.into_iter().map(|bar| PanelRow {
                symbol: symbol.clone(),
                bar,
            }));
        }
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.bar.ts.cmp(&b.bar.ts)));

        let count = duplicate_rows(&rows);
        if count > 0 {
            let first = rows
                .windows(2)
                .find(|w| w[0].symbol == w[1].symbol && w[0].bar.ts == w[1].bar.ts)
                .map(|w| (w[0].symbol.clone(), w[0].bar.ts));
            if let Some((symbol, ts)) = first {
                return DuplicateKeysSnafu {
                    timeframe,
                    count,
                    symbol,
                    ts,
                }
                .fail();
            }
        }

        tracing::debug!(%timeframe, rows = rows.len(), "Assembled panel");
        Ok(Self { timeframe, rows })
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> PanelSummary {
        let mut symbols = 0;
        let mut prev: Option<&str> = None;
        for row in &self.rows {
            if prev != Some(row.symbol.as_str()) {
                symbols += 1;
                prev = Some(&row.symbol);
            }
        }
        PanelSummary {
            timeframe: self.timeframe,
            rows: self.rows.len(),
            symbols,
            first: self.rows.iter().map(|r| r.bar.ts).min(),
            last: self.rows.iter().map(|r| r.bar.ts).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(symbol: &str, hours: &[u32]) -> BarSeries {
        let bars = hours
            .iter()
            .map(|&h| {
                let ts = Utc.with_ymd_and_hms(2025, 3, 3, h, 0, 0).unwrap();
                Bar::new(ts, 1.0, 2.0, 0.5, 1.5, 10.0)
            })
            .collect();
        BarSeries::new(symbol, "1h".parse().unwrap(), bars).unwrap()
    }

    #[test]
    fn disjoint_symbols_have_no_duplicates() {
        let panel = Panel::assemble(
            "1h".parse().unwrap(),
            [series("XAUUSD_BID", &[0, 1, 2]), series("XAGUSD_BID", &[0, 1, 2])],
        )
        .unwrap();

        assert_eq!(panel.len(), 6);
        assert_eq!(duplicate_rows(panel.rows()), 0);
        let keys: Vec<_> = panel
            .rows()
            .iter()
            .map(|r| (r.symbol.as_str(), r.bar.ts.format("%H").to_string()))
            .collect();
        assert_eq!(keys[0], ("XAGUSD_BID", "00".to_string()));
        assert_eq!(keys[3], ("XAUUSD_BID", "00".to_string()));
        assert_eq!(keys[5], ("XAUUSD_BID", "02".to_string()));
    }

    #[test]
    fn repeated_symbol_is_rejected() {
        let err = Panel::assemble(
            "1h".parse().unwrap(),
            [series("X", &[0, 1, 2]), series("X", &[2, 3])],
        )
        .unwrap_err();
        let PanelIntegrityError::DuplicateKeys { count, ts, .. } = &err else {
            panic!("unexpected {err:?}");
        };
        assert_eq!(*count, 2);
        assert_eq!(*ts, Utc.with_ymd_and_hms(2025, 3, 3, 2, 0, 0).unwrap());
    }

    #[test]
    fn mixed_widths_are_rejected() {
        let err = Panel::assemble("2h".parse().unwrap(), [series("X", &[0])]).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"[X] is 1h bars but the panel is 2h");
    }

    #[test]
    fn summary_reports_range() {
        let panel = Panel::assemble(
            "1h".parse().unwrap(),
            [series("B", &[3, 4]), series("A", &[1, 2])],
        )
        .unwrap();
        let summary = panel.summary();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.symbols, 2);
        assert_eq!(
            summary.to_string(),
            "4 rows, 2 symbols, 2025-03-03T01:00:00+00:00 .. 2025-03-03T04:00:00+00:00"
        );
    }
}
