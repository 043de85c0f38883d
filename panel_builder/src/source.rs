//! Locating the one source file that belongs to an instrument.

use std::path::{Path, PathBuf};

use snafu::{Backtrace, ResultExt, Snafu};

const SOURCE_EXTENSION: &str = ".csv";

/// Zero or several files match an instrument's prefix.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceResolutionError {
    #[snafu(display("Failed to list {}: {source}", dir.display()))]
    ListDir {
        dir: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("[{symbol}] no file matching {prefix}*{SOURCE_EXTENSION} in {}", dir.display()))]
    NotFound {
        symbol: String,
        prefix: String,
        dir: PathBuf,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "[{symbol}] expected exactly one file matching {prefix}*{SOURCE_EXTENSION}, found {}: {}",
        matches.len(),
        matches.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    ))]
    Ambiguous {
        symbol: String,
        prefix: String,
        matches: Vec<PathBuf>,
        backtrace: Backtrace,
    },
}

/// Finds the single `<prefix>*.csv` regular file directly inside `dir`.
///
/// Matching is on the file name only; subdirectories are not searched.
pub fn find_source_file(
    dir: &Path,
    symbol: &str,
    prefix: &str,
) -> Result<PathBuf, SourceResolutionError> {
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(dir).context(ListDirSnafu { dir })? {
        let entry = entry.context(ListDirSnafu { dir })?;
        let is_file = entry.file_type().context(ListDirSnafu { dir })?.is_file();
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_file && name.starts_with(prefix) && name.ends_with(SOURCE_EXTENSION) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    match matches.len() {
        0 => NotFoundSnafu { symbol, prefix, dir }.fail(),
        1 => Ok(matches.remove(0)),
        _ => AmbiguousSnafu {
            symbol,
            prefix,
            matches,
        }
        .fail(),
    }
}
