//! Fuzzy name resolution.
//!
//! Pipeline: phonetic candidate retrieval -> similarity filter with cascading
//! threshold -> one-hop transitive expansion -> ranking/dedup -> canonical
//! record selection. Every stage reads an immutable [`ReferenceSnapshot`];
//! nothing here blocks or mutates shared state, so resolutions can run in
//! parallel over one snapshot.

pub mod candidates;
pub mod canonical;
pub mod phonetic;
pub mod similarity;

use serde::Serialize;

pub use candidates::{
    CandidateSet, CandidateTier, CascadeOutcome, ExpansionOutcome, expand, filter_by_similarity,
    filter_with_cascade, rank, retrieve_candidates,
};
pub use canonical::{CanonicalStep, resolve_canonical};
pub use phonetic::{DoubleMetaphoneEncoder, PhoneticCode, PhoneticEncoder};
pub use similarity::{edit_distance, similarity};

use crate::error::ResolveError;
use crate::models::{NameRecord, ReferenceSnapshot};
use crate::store::NameLookup;

pub const DEFAULT_THRESHOLD: f64 = 0.8;
pub const DEFAULT_CASCADE_STEPS: u32 = 1;
pub const DEFAULT_EXPANSION_TRIGGER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    /// Initial similarity threshold (0.0-1.0).
    pub threshold: f64,
    /// Extra filter passes, each 0.1 lower, when a pass finds nothing.
    pub cascade_steps: u32,
    /// Expansion runs when the first filter produced fewer rows than this.
    pub expansion_trigger: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cascade_steps: DEFAULT_CASCADE_STEPS,
            expansion_trigger: DEFAULT_EXPANSION_TRIGGER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionTrace {
    pub tier: CandidateTier,
    pub candidate_count: usize,
    pub threshold_used: f64,
    pub filter_passes: u32,
    pub expansion_ran: bool,
    pub canonical_step: CanonicalStep,
}

/// Successful resolution.
///
/// `canonical.variations` is replaced by `ordered_variations`, so callers see
/// the freshly computed variation set, not what was stored at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub canonical: NameRecord,
    pub ordered_variations: Vec<String>,
    pub phonetic_code: PhoneticCode,
    pub trace: ResolutionTrace,
}

pub struct NameResolver<E> {
    encoder: E,
    options: ResolverOptions,
}

impl<E: PhoneticEncoder> NameResolver<E> {
    pub fn new(encoder: E, options: ResolverOptions) -> Self {
        Self { encoder, options }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve against a snapshot, using the snapshot itself for name lookups.
    pub fn resolve(
        &self,
        query: &str,
        snapshot: &ReferenceSnapshot,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_with_lookup(query, snapshot, snapshot)
    }

    /// Resolve with an external exact-name lookup consulted when a variation
    /// is not a record of the snapshot.
    pub fn resolve_with_lookup<L>(
        &self,
        query: &str,
        snapshot: &ReferenceSnapshot,
        lookup: &L,
    ) -> Result<Resolution, ResolveError>
    where
        L: NameLookup + ?Sized,
    {
        let opts = &self.options;
        let set = retrieve_candidates(&self.encoder, query, snapshot);
        let phonetic_code = set.code.clone();
        let Some(tier) = set.tier else {
            log::info!("No phonetic candidates for '{}' (code {})", query, phonetic_code);
            return Err(ResolveError::NoPhoneticCandidates { phonetic_code });
        };

        let cascade = filter_with_cascade(query, &set.records, opts.threshold, opts.cascade_steps);
        if cascade.results.is_empty() {
            log::info!(
                "No similar names for '{}' among {} candidates (lowest threshold {:.2})",
                query,
                set.records.len(),
                cascade.threshold_used
            );
            return Err(ResolveError::NoSimilarNames { phonetic_code });
        }

        let expansion = expand(
            cascade.results,
            &set.records,
            opts.threshold,
            opts.cascade_steps,
            opts.expansion_trigger,
        );
        let ordered_variations = rank(&expansion.results);

        let Some((mut canonical, step)) = resolve_canonical(
            query,
            &set.records,
            &ordered_variations,
            snapshot,
            lookup,
            opts.threshold,
        ) else {
            log::info!("Could not pick a canonical record for '{}'", query);
            return Err(ResolveError::CanonicalizationFailed { phonetic_code });
        };
        canonical.variations = ordered_variations.clone();

        log::debug!(
            "Resolved '{}' -> {} via {} (tier={:?}, candidates={}, threshold={:.2}, passes={}, expanded={}, variations={})",
            query,
            canonical.name,
            step.as_str(),
            tier,
            set.records.len(),
            cascade.threshold_used,
            cascade.passes,
            expansion.ran,
            ordered_variations.len()
        );

        Ok(Resolution {
            trace: ResolutionTrace {
                tier,
                candidate_count: set.records.len(),
                threshold_used: cascade.threshold_used,
                filter_passes: cascade.passes,
                expansion_ran: expansion.ran,
                canonical_step: step,
            },
            canonical,
            ordered_variations,
            phonetic_code,
        })
    }
}

impl Default for NameResolver<DoubleMetaphoneEncoder> {
    fn default() -> Self {
        Self::new(DoubleMetaphoneEncoder::default(), ResolverOptions::default())
    }
}
