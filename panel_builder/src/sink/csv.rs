//! CSV panel output.
//!
//! Columns: `ts,symbol,open,high,low,close,volume`. `ts` is RFC 3339 with a
//! `Z` suffix, so every cell names its zone. After writing, the file is read
//! back and each `ts` cell is checked to be UTC before the write is reported
//! as successful.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::{EncodeSnafu, IntegritySnafu, IoSnafu, PanelSink, SinkError};
use crate::panel::{NonUtcTimestampsSnafu, Panel};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    ts: String,
    symbol: &'a str,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct TsOnly {
    ts: String,
}

/// Writes a panel to a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PanelSink for CsvSink {
    type Output = usize;

    fn write(&self, panel: &Panel) -> Result<usize, SinkError> {
        let path = &self.path;
        let file = File::create(path).context(IoSnafu { path })?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        for row in panel.rows() {
            let bar = &row.bar;
            writer
                .serialize(CsvRow {
                    ts: bar.ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                    symbol: &row.symbol,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                })
                .context(EncodeSnafu { path })?;
        }
        writer.flush().context(IoSnafu { path })?;

        let checked = check_utc_timestamps(path)?;
        tracing::info!(path = %path.display(), rows = checked, "Wrote CSV panel");
        Ok(checked)
    }
}

/// Reads the `ts` column of a written panel and confirms every value is UTC.
///
/// Returns the number of rows checked.
pub fn check_utc_timestamps(path: &Path) -> Result<usize, SinkError> {
    let mut reader = csv::Reader::from_path(path).context(EncodeSnafu { path })?;
    let mut rows = 0;
    let mut bad: usize = 0;
    let mut first_bad = None;
    for record in reader.deserialize::<TsOnly>() {
        let TsOnly { ts } = record.context(EncodeSnafu { path })?;
        rows += 1;
        if !is_utc_cell(&ts) {
            bad += 1;
            first_bad.get_or_insert(ts);
        }
    }
    if let Some(first) = first_bad {
        return NonUtcTimestampsSnafu {
            path,
            count: bad,
            first,
        }
        .fail()
        .context(IntegritySnafu);
    }
    Ok(rows)
}

fn is_utc_cell(cell: &str) -> bool {
    DateTime::parse_from_rfc3339(cell).is_ok_and(|dt| dt.offset().local_minus_utc() == 0)
        && (cell.ends_with('Z') || cell.ends_with("+00:00"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_resampler::models::{bar::Bar, bar_series::BarSeries};
    use chrono::{TimeZone, Utc};

    fn panel() -> Panel {
        let bars = vec![
            Bar::new(Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap(), 10.0, 16.0, 9.0, 12.0, 300.0),
            Bar::new(Utc.with_ymd_and_hms(2025, 1, 6, 2, 0, 0).unwrap(), 12.0, 18.0, 11.0, 14.0, 700.0),
        ];
        let series = BarSeries::new("XAUUSD_BID", "2h".parse().unwrap(), bars).unwrap();
        Panel::assemble("2h".parse().unwrap(), [series]).unwrap()
    }

    #[test]
    fn writes_header_and_utc_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("panel_2h.csv"));

        let rows = sink.write(&panel()).unwrap();

        assert_eq!(rows, 2);
        let text = std::fs::read_to_string(sink.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ts,symbol,open,high,low,close,volume"));
        assert_eq!(lines.next(), Some("2025-01-06T00:00:00Z,XAUUSD_BID,10.0,16.0,9.0,12.0,300.0"));
    }

    #[test]
    fn read_back_flags_offset_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "ts,symbol\n2025-01-06T00:00:00Z,X\n2025-01-06T03:00:00+02:00,X\n2025-01-06 04:00:00,X\n",
        )
        .unwrap();

        let err = check_utc_timestamps(&path).unwrap_err();
        let SinkError::Integrity { source } = &err else {
            panic!("unexpected {err:?}");
        };
        assert!(source.to_string().contains("has 2 non-UTC ts values"), "{source}");
    }

    #[test]
    fn utc_cells() {
        assert!(is_utc_cell("2025-01-06T00:00:00Z"));
        assert!(is_utc_cell("2025-01-06T00:00:00+00:00"));
        assert!(!is_utc_cell("2025-01-06T00:00:00-05:00"));
        assert!(!is_utc_cell("2025-01-06T00:00:00"));
    }
}
