//! Oracle-based verification of a resampled series.
//!
//! [`verify`] recomputes the aggregation from the source through an
//! independent code path ([`oracle`]) and audits the resampler's output
//! against it:
//!
//! 1. oracle recomputation (ground truth for 2–4)
//! 2. row-count equality
//! 3. timestamp identity
//! 4. bit-exact open/high/low/close/volume identity
//! 5. left boundary: no bucket before the one holding the first source bar
//! 6. OHLC shape invariant
//! 7. volume conservation against independently summed volumes
//! 8. fence-post: each bucket holds `1..=bucket/source` source bars
//!
//! Every check runs; findings are accumulated rather than raised on the first
//! failure so one run yields the full diagnostic.

mod checks;
pub mod finding;
mod oracle;

use thiserror::Error;

pub use checks::MAX_FENCE_POST_FINDINGS;
pub use finding::{Field, Finding};

use crate::models::bar_series::BarSeries;

/// Outcome of [`verify`].
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationResult {
    /// All checks hold.
    Pass,
    /// At least one check failed; findings are in check order.
    Fail(Vec<Finding>),
}

impl VerificationResult {
    /// `true` for [`VerificationResult::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, VerificationResult::Pass)
    }

    /// Findings of a failed run, empty on pass.
    pub fn findings(&self) -> &[Finding] {
        match self {
            VerificationResult::Pass => &[],
            VerificationResult::Fail(findings) => findings,
        }
    }

    /// Turns a failed result into a [`VerificationError`] for `symbol`.
    pub fn into_result(self, symbol: &str) -> Result<(), VerificationError> {
        match self {
            VerificationResult::Pass => Ok(()),
            VerificationResult::Fail(findings) => Err(VerificationError {
                symbol: symbol.to_string(),
                findings,
            }),
        }
    }
}

/// A series failed the oracle audit. Fatal: nothing may be published.
#[derive(Debug, Error)]
#[error("VERIFICATION FAILED for {symbol}:{}", render(.symbol, .findings))]
pub struct VerificationError {
    /// Symbol of the failing series.
    pub symbol: String,
    /// Every finding, in check order.
    pub findings: Vec<Finding>,
}

fn render(symbol: &str, findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("\n  ERROR: [{symbol}] {f}"))
        .collect()
}

/// Audits `aggregated` against an oracle recomputed from `source`.
///
/// The bucket width is `aggregated`'s timeframe and the fence-post bound is
/// `bucket width / source width`.
pub fn verify(source: &BarSeries, aggregated: &BarSeries) -> VerificationResult {
    let mut findings = Vec::new();

    if source.symbol() != aggregated.symbol() {
        findings.push(Finding::SymbolMismatch {
            source: source.symbol().to_string(),
            aggregated: aggregated.symbol().to_string(),
        });
    }

    let bucket = aggregated.timeframe();
    let Some(max_per_bucket) = bucket.ratio_to(source.timeframe()) else {
        findings.push(Finding::IncompatibleTimeframes {
            source: source.timeframe(),
            bucket,
        });
        return VerificationResult::Fail(findings);
    };

    let (src, agg) = (source.bars(), aggregated.bars());

    match oracle::recompute(src, bucket) {
        Ok(expected) => {
            findings.extend(checks::row_count(agg, &expected));
            findings.extend(checks::timestamps(agg, &expected));
            findings.extend(checks::field_identity(agg, &expected));
        }
        Err(e) => findings.push(Finding::OracleFailed {
            message: e.to_string(),
        }),
    }

    findings.extend(checks::left_boundary(src, agg, bucket));
    findings.extend(checks::ohlc_shape(agg));

    match oracle::bucket_volumes(src, bucket) {
        Ok(totals) => findings.extend(checks::volume_conservation(&totals, agg)),
        Err(e) => findings.push(Finding::OracleFailed {
            message: e.to_string(),
        }),
    }

    findings.extend(checks::fence_post(src, agg, bucket, max_per_bucket));

    for finding in &findings {
        tracing::error!(symbol = source.symbol(), %finding, "verification finding");
    }

    if findings.is_empty() {
        tracing::info!(
            symbol = source.symbol(),
            rows = aggregated.len(),
            "VERIFIED: bit-exact match, all invariants hold"
        );
        VerificationResult::Pass
    } else {
        VerificationResult::Fail(findings)
    }
}
