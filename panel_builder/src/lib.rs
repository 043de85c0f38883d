//! Builds multi-symbol OHLCV panels from per-instrument hourly CSVs.
//!
//! Each instrument is loaded, resampled into coarser epoch-aligned buckets and
//! audited with [`bar_resampler::verify`] before anything is written. See
//! [`pipeline::run`].

pub mod cli;
pub mod config;
pub mod ingest;
pub mod panel;
pub mod pipeline;
pub mod sink;
pub mod source;
