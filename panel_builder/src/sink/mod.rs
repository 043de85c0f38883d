pub mod csv;
#[cfg(feature = "feather")]
pub mod feather;

use std::path::PathBuf;

use snafu::{Backtrace, Snafu};

use crate::{config::PanelFormat, panel::Panel, panel::PanelIntegrityError};

pub use self::csv::CsvSink;
#[cfg(feature = "feather")]
pub use self::feather::FeatherSink;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Creating, writing or reading back a panel file failed.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The CSV encoder failed.
    #[snafu(display("Failed to encode {}: {source}", path.display()))]
    Encode {
        path: PathBuf,
        source: ::csv::Error,
        backtrace: Backtrace,
    },

    /// Converting the panel into the destination format failed.
    #[snafu(display("Data conversion error: {message}"))]
    Conversion {
        message: String,
        backtrace: Backtrace,
    },

    /// The written data failed an integrity check.
    #[snafu(display("Panel integrity check failed"))]
    Integrity {
        #[snafu(backtrace)]
        source: PanelIntegrityError,
    },
}

/// A destination for finished panels.
pub trait PanelSink {
    /// What a successful write hands back, e.g. the path written.
    type Output;

    /// Persists `panel` in full.
    fn write(&self, panel: &Panel) -> Result<Self::Output, SinkError>;
}

/// Writes `panel` to `path` in `format`, returning the number of rows written.
pub fn write_panel(format: PanelFormat, path: PathBuf, panel: &Panel) -> Result<usize, SinkError> {
    match format {
        PanelFormat::Csv => CsvSink::new(path).write(panel),
        #[cfg(feature = "feather")]
        PanelFormat::Feather => FeatherSink::new(path).write(panel),
        #[cfg(not(feature = "feather"))]
        PanelFormat::Feather => ConversionSnafu {
            message: "feather output requires the `feather` feature",
        }
        .fail(),
    }
}
