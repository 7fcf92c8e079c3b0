//! Scenario 4 (§8): canonicalization is order-independent and stable.

use narrowphase3d::geometry::{handle_overlap, ColliderRef, Mobility};

#[test]
fn same_pair_either_operand_order_produces_the_same_pair_id() {
    let h7 = ColliderRef::new(7, Mobility::Dynamic);
    let h3 = ColliderRef::new(3, Mobility::Dynamic);

    let (_, pair_forward) = handle_overlap(0, h7, h3).unwrap();
    let (_, pair_backward) = handle_overlap(0, h3, h7).unwrap();

    assert_eq!(pair_forward, pair_backward);
}

#[test]
fn non_static_pairs_order_by_handle_regardless_of_mobility() {
    // A Kinematic collidable with a low handle against a Dynamic one with a
    // high handle: §3 orders by handle alone, so the kinematic ref must end
    // up first even though its mobility discriminant sorts after dynamic's.
    let kinematic = ColliderRef::new(1, Mobility::Kinematic);
    let dynamic = ColliderRef::new(100, Mobility::Dynamic);

    let (_, pair) = handle_overlap(0, dynamic, kinematic).unwrap();
    assert_eq!(pair.first, kinematic);
    assert_eq!(pair.second, dynamic);
}

#[test]
fn worker_index_is_threaded_through_unchanged() {
    let a = ColliderRef::new(1, Mobility::Dynamic);
    let b = ColliderRef::new(2, Mobility::Dynamic);

    let (worker, _) = handle_overlap(5, a, b).unwrap();
    assert_eq!(worker, 5);
}
