//! Arrow IPC (Feather v2) panel output via polars.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use bar_resampler::models::bar::Bar;
use polars::prelude::*;
use polars_io::{SerWriter, ipc::IpcWriter};
use snafu::ResultExt;

use super::{ConversionSnafu, IntegritySnafu, IoSnafu, PanelSink, SinkError};
use crate::panel::{NonUtcTimestampsSnafu, Panel};

const UTC: &str = "UTC";

/// Writes a panel to a single `.feather` file.
#[derive(Debug, Clone)]
pub struct FeatherSink {
    path: PathBuf,
}

impl FeatherSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn conversion(e: PolarsError) -> SinkError {
    ConversionSnafu {
        message: e.to_string(),
    }
    .build()
}

/// Builds the panel frame with `ts` as a UTC-zoned millisecond datetime.
pub fn panel_to_dataframe(panel: &Panel) -> Result<DataFrame, SinkError> {
    let rows = panel.rows();
    let ts: Vec<i64> = rows.iter().map(|r| r.bar.ts.timestamp_millis()).collect();
    let symbol: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    let field = |f: fn(&Bar) -> f64| -> Vec<f64> {
        rows.iter().map(|r| f(&r.bar)).collect()
    };

    let ts = Column::new("ts".into(), ts)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some(UTC.into())))
        .map_err(conversion)?;

    DataFrame::new(vec![
        ts,
        Column::new("symbol".into(), symbol),
        Column::new("open".into(), field(|b| b.open)),
        Column::new("high".into(), field(|b| b.high)),
        Column::new("low".into(), field(|b| b.low)),
        Column::new("close".into(), field(|b| b.close)),
        Column::new("volume".into(), field(|b| b.volume)),
    ])
    .map_err(conversion)
}

/// Confirms the frame's `ts` column is a datetime tagged with the UTC zone.
pub fn check_ts_dtype(df: &DataFrame, path: &Path) -> Result<(), SinkError> {
    let dtype = df.column("ts").map_err(conversion)?.dtype();
    match dtype {
        DataType::Datetime(_, Some(tz)) if tz.as_str() == UTC => Ok(()),
        other => NonUtcTimestampsSnafu {
            path,
            count: df.height(),
            first: other.to_string(),
        }
        .fail()
        .context(IntegritySnafu),
    }
}

impl PanelSink for FeatherSink {
    type Output = usize;

    fn write(&self, panel: &Panel) -> Result<usize, SinkError> {
        let path = &self.path;
        let mut df = panel_to_dataframe(panel)?;
        check_ts_dtype(&df, path)?;

        let mut file = File::create(path).context(IoSnafu { path })?;
        IpcWriter::new(&mut file)
            .finish(&mut df)
            .map_err(conversion)?;

        tracing::info!(path = %path.display(), rows = df.height(), "Wrote Feather panel");
        Ok(df.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_resampler::models::bar_series::BarSeries;
    use chrono::{TimeZone, Utc};

    fn panel() -> Panel {
        let ts = Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap();
        let series = BarSeries::new(
            "XAGUSD_ASK",
            "1h".parse().unwrap(),
            vec![Bar::new(ts, 30.1, 30.4, 29.9, 30.2, 12.5)],
        )
        .unwrap();
        Panel::assemble("1h".parse().unwrap(), [series]).unwrap()
    }

    #[test]
    fn frame_has_utc_ts() {
        let df = panel_to_dataframe(&panel()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.get_column_names_str(),
            ["ts", "symbol", "open", "high", "low", "close", "volume"]
        );
        check_ts_dtype(&df, Path::new("mem")).unwrap();
    }

    #[test]
    fn naive_ts_is_rejected() {
        let df = polars::df!("ts" => [1_i64]).unwrap();
        assert!(matches!(
            check_ts_dtype(&df, Path::new("mem")),
            Err(SinkError::Integrity { .. })
        ));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FeatherSink::new(dir.path().join("panel_1h.feather"));
        assert_eq!(sink.write(&panel()).unwrap(), 1);
        assert!(sink.path().metadata().unwrap().len() > 0);
    }
}
