//! Canonical record selection.
//!
//! Given the phonetic candidates and the ranked variation list, pick the one
//! record the query refers to. Steps are tried in order; the first hit wins.

use serde::Serialize;

use super::similarity::{cascade_threshold, meets_threshold, similarity};
use crate::models::{NameRecord, ReferenceSnapshot};
use crate::normalize::canonical_case;
use crate::store::NameLookup;

/// Which precedence step selected the canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStep {
    /// Query equals a candidate's name.
    ExactName,
    /// Query is close to a candidate's pipe-joined variation list.
    CloseVariations,
    /// Query equals a ranked variation, which maps to a record.
    ExactVariation,
    /// First ranked variation present as a record.
    PresentVariation,
    /// First ranked variation close to a record at the relaxed threshold.
    SimilarVariation,
}

impl CanonicalStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactName => "exact_name",
            Self::CloseVariations => "close_variations",
            Self::ExactVariation => "exact_variation",
            Self::PresentVariation => "present_variation",
            Self::SimilarVariation => "similar_variation",
        }
    }
}

/// Record named `name` in the snapshot, else from the external lookup.
fn find_record<L>(name: &str, snapshot: &ReferenceSnapshot, lookup: &L) -> Option<NameRecord>
where
    L: NameLookup + ?Sized,
{
    snapshot
        .get(name)
        .cloned()
        .or_else(|| lookup.lookup_by_name(name))
}

pub fn resolve_canonical<L>(
    query: &str,
    candidates: &[&NameRecord],
    ranked_variations: &[String],
    snapshot: &ReferenceSnapshot,
    lookup: &L,
    threshold: f64,
) -> Option<(NameRecord, CanonicalStep)>
where
    L: NameLookup + ?Sized,
{
    let q = canonical_case(query);

    if let Some(rec) = candidates.iter().find(|r| r.name == q) {
        return Some(((*rec).clone(), CanonicalStep::ExactName));
    }

    if let Some(rec) = candidates.iter().find(|r| {
        !r.variations.is_empty()
            && meets_threshold(
                similarity(&q, &canonical_case(&r.variations_joined())),
                threshold,
            )
    }) {
        return Some(((*rec).clone(), CanonicalStep::CloseVariations));
    }

    for v in ranked_variations {
        let upper = canonical_case(v);
        if upper != q {
            continue;
        }
        // a variation may be a record of its own; otherwise it belongs to one
        if let Some(rec) = find_record(&upper, snapshot, lookup)
            .or_else(|| snapshot.owner_of_variation(&upper).cloned())
        {
            return Some((rec, CanonicalStep::ExactVariation));
        }
    }

    for v in ranked_variations {
        if let Some(rec) = find_record(&canonical_case(v), snapshot, lookup) {
            return Some((rec, CanonicalStep::PresentVariation));
        }
    }

    let relaxed = cascade_threshold(threshold, 1);
    for v in ranked_variations {
        let upper = canonical_case(v);
        if let Some(rec) = snapshot
            .records()
            .iter()
            .find(|r| meets_threshold(similarity(&upper, &r.name), relaxed))
        {
            return Some((rec.clone(), CanonicalStep::SimilarVariation));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::phonetic::PhoneticCode;
    use std::collections::HashMap;

    fn rec(name: &str, vars: &[&str]) -> NameRecord {
        NameRecord {
            name: name.into(),
            classification: "M".into(),
            phonetic_code: PhoneticCode::new("SLF"),
            variations: vars.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    struct NoLookup;
    impl NameLookup for NoLookup {
        fn lookup_by_name(&self, _name: &str) -> Option<NameRecord> {
            None
        }
    }

    struct MapLookup(HashMap<String, NameRecord>);
    impl NameLookup for MapLookup {
        fn lookup_by_name(&self, name: &str) -> Option<NameRecord> {
            self.0.get(name).cloned()
        }
    }

    #[test]
    fn exact_name_wins() {
        let silva = rec("SILVA", &["SYLVA"]);
        let snap = ReferenceSnapshot::new(vec![silva.clone()]);
        let got = resolve_canonical("silva", &[&silva], &strings(&["SILVA"]), &snap, &NoLookup, 0.8);
        assert_eq!(got, Some((silva, CanonicalStep::ExactName)));
    }

    #[test]
    fn close_variation_list() {
        let luiz = rec("LUIZ", &["LUIS"]);
        let snap = ReferenceSnapshot::new(vec![luiz.clone()]);
        // "LUISS" vs "LUIS" scores 0.8
        let got = resolve_canonical("luiss", &[&luiz], &[], &snap, &NoLookup, 0.8);
        assert_eq!(got.map(|(r, s)| (r.name, s)), Some(("LUIZ".into(), CanonicalStep::CloseVariations)));
    }

    #[test]
    fn exact_variation_maps_to_owner() {
        let silva = rec("SILVA", &["SYLVA", "CILVA"]);
        let snap = ReferenceSnapshot::new(vec![silva.clone()]);
        let ranked = strings(&["SILVA", "SYLVA", "CILVA"]);
        let got = resolve_canonical("sylva", &[&silva], &ranked, &snap, &NoLookup, 0.8);
        assert_eq!(got.map(|(r, s)| (r.name, s)), Some(("SILVA".into(), CanonicalStep::ExactVariation)));
    }

    #[test]
    fn exact_variation_prefers_its_own_record() {
        let silva = rec("SILVA", &["SYLVA", "CILVA"]);
        let sylva = rec("SYLVA", &[]);
        let snap = ReferenceSnapshot::new(vec![silva.clone(), sylva]);
        let ranked = strings(&["SILVA", "SYLVA"]);
        let got = resolve_canonical("sylva", &[&silva], &ranked, &snap, &NoLookup, 0.8);
        assert_eq!(got.map(|(r, s)| (r.name, s)), Some(("SYLVA".into(), CanonicalStep::ExactVariation)));
    }

    #[test]
    fn present_variation_uses_external_lookup() {
        let snap = ReferenceSnapshot::new(vec![rec("SOUSA", &[])]);
        let souza = rec("SOUZA", &[]);
        let lookup = MapLookup(HashMap::from([("SOUZA".to_string(), souza.clone())]));
        let ranked = strings(&["SOUZZA", "SOUZA"]);
        let got = resolve_canonical("zouza", &[], &ranked, &snap, &lookup, 0.8);
        assert_eq!(got, Some((souza, CanonicalStep::PresentVariation)));
    }

    #[test]
    fn similar_variation_at_relaxed_threshold() {
        let snap = ReferenceSnapshot::new(vec![rec("ABCDEFGXYZ", &[])]);
        // 0.7 against the only record: passes only at threshold - 0.1
        let ranked = strings(&["ABCDEFGHIJ"]);
        let got = resolve_canonical("qqq", &[], &ranked, &snap, &NoLookup, 0.8);
        assert_eq!(got.map(|(r, s)| (r.name, s)), Some(("ABCDEFGXYZ".into(), CanonicalStep::SimilarVariation)));
    }

    #[test]
    fn nothing_resolves() {
        let snap = ReferenceSnapshot::new(vec![rec("ZZZZ", &[])]);
        let got = resolve_canonical("abc", &[], &strings(&["ABC"]), &snap, &NoLookup, 0.8);
        assert!(got.is_none());
    }
}
