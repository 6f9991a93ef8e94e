use std::alloc::System;

use stats_alloc::{INSTRUMENTED_SYSTEM, Region, StatsAlloc};

use name_resolver::matching::{edit_distance, similarity};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

#[test]
fn distance_memory_tracks_the_shorter_operand() {
    let long = "x".repeat(1_000_000);

    let region = Region::new(GLOBAL);
    let d = edit_distance("ab", &long);
    let s = similarity(&long, "ab");
    let stats = region.change();

    assert_eq!(d, 1_000_000);
    assert!(s < 1e-5);
    // two chars plus a three-cell column, twice; the long side is never buffered
    assert!(
        stats.bytes_allocated <= 4_096,
        "edit distance allocated too many bytes: {stats:?}"
    );
}
