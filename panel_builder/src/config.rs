//! Pipeline configuration: parsing, normalization, and loading.
//!
//! A TOML file describes one panel build:
//! - where the per-instrument source CSVs live and where panels go
//! - the source bar width and the coarser bucket width
//! - how naive source timestamps are interpreted (IANA zone, default UTC)
//! - the instrument list as an ordered `symbol = "source-file-prefix"` table
//!
//! ```toml
//! input_dir = "~/fork-tools/dukascopy-node/data"
//! output_dir = "~/fork-tools/dukascopy-node/data/alpha-forge"
//! bucket_timeframe = "2h"
//!
//! [outputs]
//! source_panel = "metals_h1"
//! bucket_panel = "metals_h2"
//!
//! [instruments]
//! XAUUSD_BID = "xauusd-h1-bid"
//! XAUUSD_ASK = "xauusd-h1-ask"
//! ```
//!
//! Normalization trims symbols and prefixes, rejects empty or duplicate
//! entries, expands a leading `~` in directories, and checks the bucket width
//! is a whole multiple of the source width.
//!
//! Entrypoints: [`load_config_str`], [`load_config_path`].

use std::{
    collections::HashSet,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use bar_resampler::timeframe::{Timeframe, TimeframeUnit};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shared_utils::env::expand_home;

/// On-disk encoding of the published panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelFormat {
    /// Comma-separated text with an RFC 3339 `ts` column.
    #[default]
    Csv,
    /// Arrow IPC (Feather v2). Requires the `feather` feature.
    Feather,
}

impl PanelFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            PanelFormat::Csv => "csv",
            PanelFormat::Feather => "feather",
        }
    }
}

/// Output file stems (extension comes from [`PanelFormat`]).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputsCfg {
    /// Stem of the source-width panel. Defaults to `panel_<source tf>`.
    pub source_panel: Option<String>,
    /// Stem of the bucket-width panel. Defaults to `panel_<bucket tf>`.
    pub bucket_panel: Option<String>,
}

/// One instrument to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument<'a> {
    /// Published symbol, e.g. `XAUUSD_BID`.
    pub symbol: &'a str,
    /// Source file name prefix, e.g. `xauusd-h1-bid`.
    pub source_prefix: &'a str,
}

/// Everything a panel build needs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the source CSVs.
    pub input_dir: PathBuf,
    /// Directory the panels are written to; created when missing.
    pub output_dir: PathBuf,
    /// Width of the source bars.
    #[serde(default = "default_source_timeframe")]
    pub source_timeframe: Timeframe,
    /// Width of the resampled buckets.
    #[serde(default = "default_bucket_timeframe")]
    pub bucket_timeframe: Timeframe,
    /// Zone applied to source timestamps that carry no offset.
    #[serde(default = "default_source_timezone")]
    pub source_timezone: Tz,
    /// Panel encoding.
    #[serde(default)]
    pub format: PanelFormat,
    /// Output file stems.
    #[serde(default)]
    pub outputs: OutputsCfg,
    /// Map of symbol -> source file prefix, in processing order.
    pub instruments: IndexMap<String, String>,
}

const H1: NonZeroU32 = match NonZeroU32::new(1) {
    Some(nz) => nz,
    None => unreachable!(),
};

const H2: NonZeroU32 = match NonZeroU32::new(2) {
    Some(nz) => nz,
    None => unreachable!(),
};

fn default_source_timeframe() -> Timeframe {
    Timeframe::new(H1, TimeframeUnit::Hour)
}

fn default_bucket_timeframe() -> Timeframe {
    Timeframe::new(H2, TimeframeUnit::Hour)
}

fn default_source_timezone() -> Tz {
    chrono_tz::UTC
}

impl PipelineConfig {
    /// Instruments in configuration order.
    pub fn instruments(&self) -> impl Iterator<Item = Instrument<'_>> {
        self.instruments.iter().map(|(symbol, prefix)| Instrument {
            symbol,
            source_prefix: prefix,
        })
    }

    /// Path of the source-width panel.
    pub fn source_panel_path(&self) -> PathBuf {
        self.panel_path(self.outputs.source_panel.as_deref(), self.source_timeframe)
    }

    /// Path of the bucket-width panel.
    pub fn bucket_panel_path(&self) -> PathBuf {
        self.panel_path(self.outputs.bucket_panel.as_deref(), self.bucket_timeframe)
    }

    fn panel_path(&self, stem: Option<&str>, tf: Timeframe) -> PathBuf {
        let stem = stem.map_or_else(|| format!("panel_{tf}"), str::to_string);
        self.output_dir
            .join(format!("{stem}.{}", self.format.extension()))
    }
}

/// Normalize a configuration in place.
///
/// What normalization does:
/// - Trim symbols and prefixes; reject empty values
/// - Reject symbols or prefixes that collide after trimming
/// - Expand a leading `~` in `input_dir` / `output_dir`
/// - Require `bucket_timeframe` to be a whole multiple of `source_timeframe`
/// - Reject the `feather` format when the crate is built without it
pub fn normalize_config(cfg: &mut PipelineConfig) -> anyhow::Result<()> {
    if cfg.instruments.is_empty() {
        bail!("at least one instrument must be configured");
    }

    let mut rebuilt: IndexMap<String, String> = IndexMap::new();
    let mut seen_prefix = HashSet::new();
    for (raw_symbol, raw_prefix) in std::mem::take(&mut cfg.instruments) {
        let symbol = raw_symbol.trim().to_string();
        let prefix = raw_prefix.trim().to_string();
        if symbol.is_empty() {
            bail!("instrument symbol cannot be empty after trimming");
        }
        if prefix.is_empty() {
            bail!("source prefix for {symbol} cannot be empty after trimming");
        }
        if rebuilt.contains_key(&symbol) {
            bail!("duplicate instrument symbol after normalization: {symbol}");
        }
        if !seen_prefix.insert(prefix.clone()) {
            bail!("source prefix {prefix} is used by more than one instrument");
        }
        rebuilt.insert(symbol, prefix);
    }
    cfg.instruments = rebuilt;

    cfg.input_dir = expand_home(&cfg.input_dir).context("expanding input_dir")?;
    cfg.output_dir = expand_home(&cfg.output_dir).context("expanding output_dir")?;

    if cfg.bucket_timeframe.ratio_to(cfg.source_timeframe).is_none() {
        bail!(
            "bucket_timeframe {} is not a whole multiple of source_timeframe {}",
            cfg.bucket_timeframe,
            cfg.source_timeframe
        );
    }

    if cfg.format == PanelFormat::Feather && !cfg!(feature = "feather") {
        bail!("format = \"feather\" requires panel_builder built with the `feather` feature");
    }

    for stem in [&cfg.outputs.source_panel, &cfg.outputs.bucket_panel]
        .into_iter()
        .flatten()
    {
        if stem.trim().is_empty() {
            bail!("output panel names cannot be empty");
        }
    }
    if cfg.source_panel_path() == cfg.bucket_panel_path() {
        bail!(
            "source and bucket panels would both be written to {}",
            cfg.source_panel_path().display()
        );
    }

    Ok(())
}

/// Parse + normalize a configuration from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<PipelineConfig> {
    let mut cfg: PipelineConfig = toml::from_str(s).context("parsing pipeline config")?;
    normalize_config(&mut cfg)?;
    Ok(cfg)
}

/// Parse + normalize a configuration from a file.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<PipelineConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    load_config_str(&s).with_context(|| format!("loading config {}", path.display()))
}
