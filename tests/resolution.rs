use std::sync::Arc;

use name_resolver::error::ResolveError;
use name_resolver::ingest::csv_import::read_names;
use name_resolver::matching::{
    CandidateTier, CanonicalStep, DoubleMetaphoneEncoder, NameResolver, PhoneticEncoder,
    ResolverOptions, expand, filter_with_cascade, rank, retrieve_candidates,
};
use name_resolver::models::{NameRecord, NewName, ReferenceSnapshot};
use name_resolver::orchestrator::{LookupFailure, ResolverService, store_service};
use name_resolver::store::{FixedSnapshot, NameStore, SnapshotProvider};

fn record(enc: &DoubleMetaphoneEncoder, name: &str, vars: &[&str]) -> NameRecord {
    NameRecord {
        name: name.into(),
        classification: "S".into(),
        phonetic_code: enc.encode(name),
        variations: vars.iter().map(|s| s.to_string()).collect(),
    }
}

fn silva_snapshot() -> ReferenceSnapshot {
    let enc = DoubleMetaphoneEncoder::default();
    ReferenceSnapshot::new(vec![
        record(&enc, "SILVA", &["SYLVA", "CILVA"]),
        record(&enc, "MARIA", &["MARYA"]),
    ])
}

#[test]
fn exact_name_resolves_in_any_case() {
    let snap = silva_snapshot();
    let resolver = NameResolver::default();
    for q in ["silva", "SILVA", "sIlVa"] {
        let res = resolver.resolve(q, &snap).expect("resolves");
        assert_eq!(res.canonical.name, "SILVA");
        assert_eq!(res.trace.canonical_step, CanonicalStep::ExactName);
        assert_eq!(res.trace.tier, CandidateTier::ExactCode);
        assert!(res.ordered_variations.contains(&"SYLVA".to_string()));
        assert!(res.ordered_variations.contains(&"CILVA".to_string()));
    }
}

#[test]
fn stored_variation_resolves_to_its_owner() {
    let snap = silva_snapshot();
    let res = NameResolver::default()
        .resolve("SYLVA", &snap)
        .expect("resolves");
    assert_eq!(res.canonical.name, "SILVA");
    assert_eq!(res.trace.canonical_step, CanonicalStep::ExactVariation);
}

#[test]
fn no_phonetic_neighbour_reports_the_code() {
    let snap = silva_snapshot();
    let enc = DoubleMetaphoneEncoder::default();
    let err = NameResolver::default().resolve("BOB", &snap).unwrap_err();
    match &err {
        ResolveError::NoPhoneticCandidates { phonetic_code } => {
            assert_eq!(phonetic_code, &enc.encode("BOB"));
            assert!(!phonetic_code.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(err.kind(), "no_phonetic_candidates");
}

#[test]
fn expansion_runs_once_even_when_still_short() {
    let snap = silva_snapshot();
    let enc = DoubleMetaphoneEncoder::default();
    let opts = ResolverOptions::default();

    let set = retrieve_candidates(&enc, "silva", &snap);
    let first = filter_with_cascade("silva", &set.records, opts.threshold, opts.cascade_steps);
    assert_eq!(first.results.len(), 3);

    let seeds = first.results.len();
    let expanded = expand(
        first.results,
        &set.records,
        opts.threshold,
        opts.cascade_steps,
        opts.expansion_trigger,
    );
    assert!(expanded.ran);
    assert_eq!(expanded.requeries, seeds);
    let ranked = rank(&expanded.results);
    assert!(ranked.len() < opts.expansion_trigger);
    assert_eq!(ranked.len(), 3);

    let res = NameResolver::default().resolve("silva", &snap).unwrap();
    assert!(res.trace.expansion_ran);
    assert_eq!(res.ordered_variations, ranked);
}

#[test]
fn repeated_resolution_is_stable() {
    let snap = silva_snapshot();
    let resolver = NameResolver::default();
    let a = resolver.resolve("maria", &snap).unwrap();
    let b = resolver.resolve("maria", &snap).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.canonical.name, "MARIA");
}

#[test]
fn store_writes_are_visible_to_the_next_resolution() {
    let csv = "name,classification,metaphone,variations\n\
               SILVA,S,,SYLVA|CILVA\n\
               SOUZA,S,,SOUSA|SOZA\n";
    let store = Arc::new(NameStore::default());
    for new in read_names(csv.as_bytes()).unwrap() {
        store.insert(new).unwrap();
    }
    let before = store.current_snapshot();
    let service = store_service(Arc::clone(&store), ResolverOptions::default());

    assert!(matches!(
        service.resolve("maria"),
        Err(LookupFailure::NotFound(ResolveError::NoPhoneticCandidates { .. }))
    ));

    store
        .insert(NewName {
            name: "maria".into(),
            classification: "F".into(),
            variations: vec!["marya".into()],
        })
        .unwrap();
    let res = service.resolve("maria").unwrap();
    assert_eq!(res.canonical.name, "MARIA");
    assert_eq!(res.canonical.variations, res.ordered_variations);

    // snapshots taken earlier are unaffected
    assert_eq!(before.len(), 2);
    assert_eq!(store.current_snapshot().len(), 3);
}

#[test]
fn variation_added_after_the_snapshot_is_found_through_the_live_lookup() {
    let store = Arc::new(NameStore::default());
    store
        .insert(NewName {
            name: "SYLVA".into(),
            classification: "V".into(),
            variations: vec![],
        })
        .unwrap();
    // the snapshot predates the SYLVA row
    let service = ResolverService::new(
        FixedSnapshot(Arc::new(silva_snapshot())),
        Arc::clone(&store),
        NameResolver::default(),
    );

    let res = service.resolve("sylva").unwrap();
    assert_eq!(res.canonical.name, "SYLVA");
    assert_eq!(res.canonical.classification, "V");
    assert_eq!(res.trace.canonical_step, CanonicalStep::ExactVariation);
    assert_eq!(res.canonical.variations, res.ordered_variations);
}

#[test]
fn cascade_lowers_the_threshold_when_the_first_pass_is_empty() {
    let enc = DoubleMetaphoneEncoder::default();
    let snap = ReferenceSnapshot::new(vec![record(&enc, "SILVERA", &[])]);
    assert_eq!(enc.encode("SYLVERO"), enc.encode("SILVERA"));

    // two substitutions over seven chars: 5/7, below 0.8 but above 0.7
    let res = NameResolver::default().resolve("SYLVERO", &snap).unwrap();
    assert_eq!(res.canonical.name, "SILVERA");
    assert_eq!(res.trace.filter_passes, 2);
    assert!(res.trace.threshold_used < ResolverOptions::default().threshold);
    assert!((res.trace.threshold_used - 0.7).abs() < 1e-9);
    assert_eq!(res.trace.canonical_step, CanonicalStep::PresentVariation);

    let strict = NameResolver::new(
        enc,
        ResolverOptions {
            cascade_steps: 0,
            ..Default::default()
        },
    );
    assert!(matches!(
        strict.resolve("SYLVERO", &snap),
        Err(ResolveError::NoSimilarNames { .. })
    ));
}
