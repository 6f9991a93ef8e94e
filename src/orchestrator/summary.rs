//! Batch run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::{BatchOutcome, LookupFailure};
use crate::error::ResolveError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub resolved: usize,
    pub invalid: usize,
    pub no_phonetic_candidates: usize,
    pub no_similar_names: usize,
    pub canonicalization_failed: usize,
    pub reference_size: usize,
    pub elapsed_ms: u128,
    pub started_utc: DateTime<Utc>,
}

impl BatchSummary {
    pub fn from_outcomes(
        outcomes: &[BatchOutcome],
        reference_size: usize,
        started_utc: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let mut s = Self {
            total: outcomes.len(),
            reference_size,
            elapsed_ms: elapsed.as_millis(),
            started_utc,
            ..Default::default()
        };
        for o in outcomes {
            match &o.result {
                Ok(_) => s.resolved += 1,
                Err(LookupFailure::Invalid(_)) => s.invalid += 1,
                Err(LookupFailure::NotFound(e)) => match e {
                    ResolveError::NoPhoneticCandidates { .. } => s.no_phonetic_candidates += 1,
                    ResolveError::NoSimilarNames { .. } => s.no_similar_names += 1,
                    ResolveError::CanonicalizationFailed { .. } => s.canonicalization_failed += 1,
                },
            }
        }
        s
    }

    pub fn unresolved(&self) -> usize {
        self.total - self.resolved
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch: {} queries, {} resolved, {} unresolved (invalid={}, no_phonetic={}, no_similar={}, no_canonical={}) over {} names in {} ms",
            self.total,
            self.resolved,
            self.unresolved(),
            self.invalid,
            self.no_phonetic_candidates,
            self.no_similar_names,
            self.canonicalization_failed,
            self.reference_size,
            self.elapsed_ms
        )
    }
}
