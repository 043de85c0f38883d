//! Canonical bar models shared by the resampler, the verifier and the panel layer.

pub mod bar;
pub mod bar_series;
