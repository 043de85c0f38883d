use std::{fmt::Write as _, path::PathBuf};

use anyhow::{Context, Result};
use bar_resampler::timeframe::Timeframe;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use shared_utils::env::get_env_var_opt;

use crate::{
    config::load_config_path,
    pipeline::{RunOptions, RunSummary, SeriesSummary, process_series, run},
};

/// Environment variable consulted when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "PANEL_BUILDER_CONFIG";

#[derive(Parser, Debug)]
#[command(version, about = "Build verified OHLCV panels")]
pub struct Cli {
    /// Path to the pipeline config (TOML). Falls back to $PANEL_BUILDER_CONFIG.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest, resample, verify and write both panels
    Build {
        /// Run every stage but do not write panels
        #[arg(long)]
        dry_run: bool,
    },

    /// Resample and verify a single source CSV without writing anything
    Verify {
        /// Source CSV
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Symbol to tag the series with
        #[arg(long)]
        symbol: String,

        /// Width of the source bars
        #[arg(long, default_value = "1h")]
        source_timeframe: Timeframe,

        /// Width of the buckets
        #[arg(long, default_value = "2h")]
        bucket_timeframe: Timeframe,

        /// IANA zone for timestamps without an offset
        #[arg(long, default_value = "UTC")]
        timezone: Tz,
    },
}

fn config_path(cli_value: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_value {
        return Ok(path);
    }
    get_env_var_opt(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .with_context(|| format!("no --config given and {CONFIG_ENV_VAR} is not set"))
}

/// Executes a parsed command line, returning the text to print on success.
pub fn execute(cli: Cli) -> Result<String> {
    match cli.command {
        Command::Build { dry_run } => {
            let path = config_path(cli.config)?;
            let cfg = load_config_path(&path)?;
            let summary = run(&cfg, RunOptions { dry_run })?;
            Ok(render_run(&summary))
        }
        Command::Verify {
            input,
            symbol,
            source_timeframe,
            bucket_timeframe,
            timezone,
        } => {
            let verified =
                process_series(&input, &symbol, source_timeframe, bucket_timeframe, timezone)?;
            Ok(format!("VERIFIED: {}\n", render_series(&verified.summary())))
        }
    }
}

fn render_series(s: &SeriesSummary) -> String {
    format!(
        "{} {} rows [{} .. {}] -> {} rows [{} .. {}]",
        s.symbol,
        s.source_rows,
        s.source_span.0.to_rfc3339(),
        s.source_span.1.to_rfc3339(),
        s.bucket_rows,
        s.bucket_span.0.to_rfc3339(),
        s.bucket_span.1.to_rfc3339(),
    )
}

/// Human-readable report of a finished build.
pub fn render_run(summary: &RunSummary) -> String {
    let mut out = String::new();
    for s in &summary.series {
        let _ = writeln!(out, "VERIFIED: {}", render_series(s));
    }
    for p in &summary.panels {
        match p.written {
            Some(rows) => {
                let _ = writeln!(out, "WROTE {}: {}", p.path.display(), p.summary);
                let _ = writeln!(out, "  no duplicate (ts, symbol) rows; {rows} ts values UTC");
            }
            None => {
                let _ = writeln!(out, "DRY RUN {}: {}", p.path.display(), p.summary);
            }
        }
    }
    out
}
