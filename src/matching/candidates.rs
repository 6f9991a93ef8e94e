//! Candidate retrieval, similarity filtering, transitive expansion and ranking.

use serde::Serialize;
use std::collections::HashSet;

use super::phonetic::{PhoneticCode, PhoneticEncoder};
use super::similarity::{cascade_threshold, meets_threshold, similarity};
use crate::models::{NameRecord, ReferenceSnapshot, SimilarityCandidate};

/// Which phonetic bucket produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateTier {
    ExactCode,
    CloseCode,
}

#[derive(Debug, Clone)]
pub struct CandidateSet<'a> {
    pub code: PhoneticCode,
    pub tier: Option<CandidateTier>,
    pub records: Vec<&'a NameRecord>,
}

impl CandidateSet<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Two-tier phonetic retrieval: the exact-code bucket, else the close-code
/// bucket. Stops at the first non-empty tier.
pub fn retrieve_candidates<'a, E>(
    encoder: &E,
    query: &str,
    snapshot: &'a ReferenceSnapshot,
) -> CandidateSet<'a>
where
    E: PhoneticEncoder + ?Sized,
{
    let code = encoder.encode(query);
    if code.is_empty() {
        return CandidateSet {
            code,
            tier: None,
            records: Vec::new(),
        };
    }

    let exact: Vec<&NameRecord> = snapshot
        .records()
        .iter()
        .filter(|r| r.phonetic_code == code)
        .collect();
    if !exact.is_empty() {
        return CandidateSet {
            code,
            tier: Some(CandidateTier::ExactCode),
            records: exact,
        };
    }

    let close: Vec<&NameRecord> = snapshot
        .records()
        .iter()
        .filter(|r| encoder.is_close(&code, &r.phonetic_code))
        .collect();
    let tier = (!close.is_empty()).then_some(CandidateTier::CloseCode);
    CandidateSet {
        code,
        tier,
        records: close,
    }
}

/// Single filter pass. A record that passes contributes one row for its name
/// and one per non-empty variation, all carrying the record's score.
pub fn filter_by_similarity(
    query: &str,
    candidates: &[&NameRecord],
    threshold: f64,
) -> Vec<SimilarityCandidate> {
    let q = query.to_lowercase();
    let mut out = Vec::new();
    for rec in candidates {
        let score = similarity(&q, &rec.name.to_lowercase());
        if !meets_threshold(score, threshold) {
            continue;
        }
        out.push(SimilarityCandidate {
            name: rec.name.clone(),
            score,
        });
        for v in rec.variations.iter().filter(|v| !v.trim().is_empty()) {
            out.push(SimilarityCandidate {
                name: v.clone(),
                score,
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    pub results: Vec<SimilarityCandidate>,
    /// Threshold of the last pass performed.
    pub threshold_used: f64,
    /// Number of filter passes performed (1 + retries).
    pub passes: u32,
}

/// Filter at `threshold`, then retry up to `cascade_steps` times, each 0.1
/// lower, until something passes. No floor is enforced here.
pub fn filter_with_cascade(
    query: &str,
    candidates: &[&NameRecord],
    threshold: f64,
    cascade_steps: u32,
) -> CascadeOutcome {
    let mut outcome = CascadeOutcome {
        results: Vec::new(),
        threshold_used: threshold,
        passes: 0,
    };
    for step in 0..=cascade_steps {
        let t = cascade_threshold(threshold, step);
        outcome.results = filter_by_similarity(query, candidates, t);
        outcome.threshold_used = t;
        outcome.passes += 1;
        if !outcome.results.is_empty() {
            break;
        }
    }
    outcome
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionOutcome {
    pub results: Vec<SimilarityCandidate>,
    pub ran: bool,
    /// Filter invocations made by the expansion pass.
    pub requeries: usize,
}

/// One-hop transitive expansion. When fewer than `trigger` rows were found,
/// every found name is used once as a new query over the same candidates and
/// the new rows are appended (duplicates are left for ranking).
pub fn expand(
    results: Vec<SimilarityCandidate>,
    candidates: &[&NameRecord],
    threshold: f64,
    cascade_steps: u32,
    trigger: usize,
) -> ExpansionOutcome {
    if results.len() >= trigger {
        return ExpansionOutcome {
            results,
            ran: false,
            requeries: 0,
        };
    }
    let seeds: Vec<String> = results.iter().map(|c| c.name.clone()).collect();
    let mut merged = results;
    for seed in &seeds {
        let found = filter_with_cascade(seed, candidates, threshold, cascade_steps);
        merged.extend(found.results);
    }
    ExpansionOutcome {
        results: merged,
        ran: true,
        requeries: seeds.len(),
    }
}

/// Order by descending score, then ascending name length; keep the first
/// occurrence of each name.
pub fn rank(results: &[SimilarityCandidate]) -> Vec<String> {
    let mut sorted: Vec<&SimilarityCandidate> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.chars().count().cmp(&b.name.chars().count()))
    });
    let mut seen: HashSet<&str> = HashSet::with_capacity(sorted.len());
    let mut out = Vec::with_capacity(sorted.len());
    for c in sorted {
        if seen.insert(c.name.as_str()) {
            out.push(c.name.clone());
        }
    }
    out
}
