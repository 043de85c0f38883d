use std::path::Path;

use serde::Deserialize;
use snafu::ResultExt;

use super::{CsvSnafu, IngestError};

/// One undecoded source row. `timestamp` is parsed during normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawBar {
    #[serde(alias = "ts", alias = "time")]
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reads every row of a source CSV, in file order.
pub fn read_raw_bars(path: &Path) -> Result<Vec<RawBar>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvSnafu { path })?;

    reader
        .deserialize::<RawBar>()
        .collect::<Result<Vec<_>, _>>()
        .context(CsvSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_dukascopy_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "timestamp,open,high,low,close,volume\n\
             1704067200000,2062.95,2065.2,2062.1,2064.55,0.45\n\
             1704070800000, 2064.55 ,2066.0,2063.9,2065.1,0.51\n"
        )
        .unwrap();

        let rows = read_raw_bars(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "1704067200000");
        assert_eq!(rows[1].open, 2064.55);
        assert_eq!(rows[1].volume, 0.51);
    }

    #[test]
    fn accepts_ts_header_and_extra_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "ts,open,high,low,close,volume,spread\n2024-01-01T00:00:00Z,1,2,0.5,1.5,10,0.2\n"
        )
        .unwrap();
        let rows = read_raw_bars(file.path()).unwrap();
        assert_eq!(rows[0].timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn missing_column_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "timestamp,open,high,low,close\n1,1,1,1,1\n").unwrap();
        let err = read_raw_bars(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Csv { .. }));
    }
}
