//! Result ranker.
//!
//! Imposes the only total order in the pipeline: candidates sorted
//! ascending by price ratio (largest relative discount first), plus the
//! explicit "nothing to do" signal that distinguishes an empty result
//! from an uncomputed one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::DealCandidate;

/// Ranked outcome of one scan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    /// Candidates ascending by `price_ratio`; ties keep arrival order.
    pub candidates: Vec<DealCandidate>,
    /// Set iff the scan completed and found nothing. Never used to
    /// encode a failure.
    pub nothing_to_do: bool,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nothing_to_do {
            write!(f, "no deals found")
        } else {
            write!(
                f,
                "{} deals (best ratio {})",
                self.candidates.len(),
                self.candidates[0].price_ratio,
            )
        }
    }
}

/// Rank aggregated candidates: stable ascending sort by price ratio.
pub fn rank(mut candidates: Vec<DealCandidate>) -> ScanReport {
    candidates.sort_by(|a, b| a.price_ratio.cmp(&b.price_ratio));
    let nothing_to_do = candidates.is_empty();

    ScanReport {
        generated_at: Utc::now(),
        candidates,
        nothing_to_do,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
