//! End-to-end panel build.
//!
//! Order of work:
//! 1. resolve every instrument's source file (nothing is read until all resolve)
//! 2. per symbol: load + normalize, resample, verify; any failure stops the run
//! 3. assemble the source-width and bucket-width panels
//! 4. write both panels, unless this is a dry run
//!
//! Panels are only written once every symbol has passed verification, so a
//! failing run leaves no new panel on disk.

use std::path::{Path, PathBuf};

use bar_resampler::{
    models::bar_series::BarSeries,
    resample::{ResampleError, resample},
    timeframe::Timeframe,
    verify::{VerificationError, verify},
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use snafu::{Backtrace, ResultExt, Snafu};

use crate::{
    config::PipelineConfig,
    ingest::{IngestError, load_series},
    panel::{Panel, PanelIntegrityError, PanelSummary},
    sink::{SinkError, write_panel},
    source::{SourceResolutionError, find_source_file},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(display("Source resolution failed"))]
    SourceResolution {
        #[snafu(backtrace)]
        source: SourceResolutionError,
    },

    #[snafu(display("Ingest failed"))]
    Ingest {
        #[snafu(backtrace)]
        source: IngestError,
    },

    #[snafu(display("Resampling failed"))]
    Resample {
        #[snafu(backtrace)]
        source: ResampleError,
    },

    #[snafu(display("Verification gate failed"))]
    Verification {
        source: VerificationError,
        backtrace: Backtrace,
    },

    #[snafu(display("Panel integrity check failed"))]
    PanelIntegrity {
        #[snafu(backtrace)]
        source: PanelIntegrityError,
    },

    #[snafu(display("Writing {} failed", path.display()))]
    Sink {
        path: PathBuf,
        #[snafu(backtrace)]
        source: SinkError,
    },

    #[snafu(display("Failed to create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Knobs for [`run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Run every stage except writing panels.
    pub dry_run: bool,
}

/// Row counts and coverage of one symbol at both widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSummary {
    pub symbol: String,
    pub source_rows: usize,
    pub source_span: (DateTime<Utc>, DateTime<Utc>),
    pub bucket_rows: usize,
    pub bucket_span: (DateTime<Utc>, DateTime<Utc>),
}

/// A panel that was (or, on a dry run, would have been) written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelReport {
    pub path: PathBuf,
    pub summary: PanelSummary,
    /// Rows confirmed UTC after writing; `None` on a dry run.
    pub written: Option<usize>,
}

/// What a successful [`run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub series: Vec<SeriesSummary>,
    pub panels: Vec<PanelReport>,
}

/// One verified symbol at both widths.
#[derive(Debug, Clone)]
pub struct VerifiedSeries {
    pub source: BarSeries,
    pub bucketed: BarSeries,
}

impl VerifiedSeries {
    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary {
            symbol: self.source.symbol().to_string(),
            source_rows: self.source.len(),
            source_span: self.source.span(),
            bucket_rows: self.bucketed.len(),
            bucket_span: self.bucketed.span(),
        }
    }
}

/// Loads one source file, resamples it and runs the oracle audit.
///
/// Returns the verified pair, or the first failing stage's error. A failed
/// audit carries every finding.
pub fn process_series(
    path: &Path,
    symbol: &str,
    source_timeframe: Timeframe,
    bucket_timeframe: Timeframe,
    tz: Tz,
) -> Result<VerifiedSeries, PipelineError> {
    let source = load_series(path, symbol, source_timeframe, tz).context(IngestSnafu)?;
    let (first, last) = source.span();
    tracing::info!(
        symbol,
        timeframe = %source_timeframe,
        rows = source.len(),
        first = %first,
        last = %last,
        "Loaded source series"
    );

    let bucketed = resample(&source, bucket_timeframe).context(ResampleSnafu)?;
    let (first, last) = bucketed.span();
    tracing::info!(
        symbol,
        timeframe = %bucket_timeframe,
        rows = bucketed.len(),
        first = %first,
        last = %last,
        "Resampled series"
    );

    verify(&source, &bucketed)
        .into_result(symbol)
        .context(VerificationSnafu)?;

    Ok(VerifiedSeries { source, bucketed })
}

/// Runs the whole build described by `cfg`.
pub fn run(cfg: &PipelineConfig, opts: RunOptions) -> Result<RunSummary, PipelineError> {
    let sources = cfg
        .instruments()
        .map(|inst| {
            find_source_file(&cfg.input_dir, inst.symbol, inst.source_prefix)
                .map(|path| (inst.symbol, path))
        })
        .collect::<Result<Vec<_>, _>>()
        .context(SourceResolutionSnafu)?;
    for (symbol, path) in &sources {
        tracing::debug!(symbol, path = %path.display(), "Resolved source file");
    }

    let mut verified = Vec::with_capacity(sources.len());
    for (symbol, path) in &sources {
        verified.push(process_series(
            path,
            symbol,
            cfg.source_timeframe,
            cfg.bucket_timeframe,
            cfg.source_timezone,
        )?);
    }
    let series = verified.iter().map(VerifiedSeries::summary).collect();

    let (sources, bucketed): (Vec<_>, Vec<_>) = verified
        .into_iter()
        .map(|v| (v.source, v.bucketed))
        .unzip();
    let panels = [
        (
            cfg.source_panel_path(),
            Panel::assemble(cfg.source_timeframe, sources).context(PanelIntegritySnafu)?,
        ),
        (
            cfg.bucket_panel_path(),
            Panel::assemble(cfg.bucket_timeframe, bucketed).context(PanelIntegritySnafu)?,
        ),
    ];

    if !opts.dry_run {
        std::fs::create_dir_all(&cfg.output_dir).context(CreateOutputDirSnafu {
            path: &cfg.output_dir,
        })?;
    }

    let mut reports = Vec::with_capacity(panels.len());
    for (path, panel) in panels {
        let summary = panel.summary();
        let written = if opts.dry_run {
            tracing::info!(path = %path.display(), %summary, "Dry run, panel not written");
            None
        } else {
            let rows =
                write_panel(cfg.format, path.clone(), &panel).context(SinkSnafu { path: &path })?;
            Some(rows)
        };
        reports.push(PanelReport {
            path,
            summary,
            written,
        });
    }

    Ok(RunSummary {
        series,
        panels: reports,
    })
}
