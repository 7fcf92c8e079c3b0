//! Scenario 5 (§8): a pair in contact on frame N, separated on frame N+1,
//! is evicted from the pair cache on N+1's flush and its constraint handle
//! is returned so the owning constraint can be queued for removal.

use narrowphase3d::dynamics::solver::ConstraintHandle;
use narrowphase3d::geometry::{ColliderRef, Mobility, PairCache, PairCacheDelta, PairId, PairScratch};

fn pair(a: u32, b: u32) -> PairId {
    PairId::canonicalize(
        ColliderRef::new(a, Mobility::Dynamic),
        ColliderRef::new(b, Mobility::Dynamic),
    )
    .unwrap()
}

#[test]
fn separated_pair_is_absent_after_the_first_frame_it_is_not_revisited() {
    let mut cache = PairCache::new();
    let p = pair(10, 20);
    let handle = ConstraintHandle(99);

    // Frame N: the pair is in contact, a constraint is created for it.
    let mut delta = PairCacheDelta::new();
    PairCache::mark_pending_add(&mut delta, p, Some(handle), PairScratch::default());
    let removed_n = cache.flush([delta]);
    assert!(removed_n.is_empty());
    assert!(cache.lookup(&p).is_some());

    // Frame N+1: the bodies separated, so narrow phase never calls
    // `handle_overlap` for this pair again this frame — no delta mentions it.
    let removed_n_plus_1 = cache.flush([PairCacheDelta::new()]);

    assert_eq!(removed_n_plus_1, vec![handle]);
    assert!(cache.lookup(&p).is_none());
}
