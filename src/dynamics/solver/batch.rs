//! Graph-coloring batch construction (§4.7): greedily assigns each
//! constraint to the first batch whose body set doesn't already include any
//! of the constraint's bodies, so every batch can run its constraints in
//! parallel bundles without two constraints racing on the same body.
//!
//! Bodies whose constraint degree exceeds `fallback_batch_threshold` are
//! instead routed to a single fallback batch, solved with Jacobi-style
//! averaging (each constraint reads/writes through an isolated delta that
//! is summed back in, rather than mutating shared state in place) so a
//! high-degree body doesn't force an unbounded number of colors.

use std::collections::HashMap;

use bit_vec::BitVec;

use crate::dynamics::solver::ConstraintEntry;

#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub constraint_indices: Vec<usize>,
}

pub struct BatchSet {
    pub batches: Vec<Batch>,
    pub fallback: Option<Batch>,
}

/// Builds the batch set for one step's constraint list.
///
/// `num_bodies` bounds the per-batch occupancy bitset; `fallback_threshold`
/// is the per-body constraint-degree cutoff above which a body's
/// constraints are deferred to the fallback batch.
pub fn build_batches(entries: &[ConstraintEntry], num_bodies: usize, fallback_threshold: u32) -> BatchSet {
    let mut degree: HashMap<usize, u32> = HashMap::new();
    for entry in entries {
        for &b in entry.bodies.as_slice() {
            *degree.entry(b).or_insert(0) += 1;
        }
    }

    let is_high_degree = |b: usize| degree.get(&b).copied().unwrap_or(0) > fallback_threshold;

    let mut batches: Vec<Batch> = Vec::new();
    let mut occupancy: Vec<BitVec> = Vec::new();
    let mut fallback = Batch::default();

    for (index, entry) in entries.iter().enumerate() {
        let bodies = entry.bodies.as_slice();

        if bodies.iter().any(|&b| is_high_degree(b)) {
            fallback.constraint_indices.push(index);
            continue;
        }

        let mut placed = false;
        for (batch, used) in batches.iter_mut().zip(occupancy.iter_mut()) {
            if bodies.iter().all(|&b| !used[b]) {
                for &b in bodies {
                    used.set(b, true);
                }
                batch.constraint_indices.push(index);
                placed = true;
                break;
            }
        }

        if !placed {
            let mut used = BitVec::from_elem(num_bodies, false);
            for &b in bodies {
                used.set(b, true);
            }
            occupancy.push(used);
            batches.push(Batch {
                constraint_indices: vec![index],
            });
        }
    }

    BatchSet {
        batches,
        fallback: if fallback.constraint_indices.is_empty() {
            None
        } else {
            Some(fallback)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::solver::contact_constraint::ContactConstraint;
    use crate::dynamics::solver::softness::Softness;
    use crate::dynamics::solver::{ConstraintEntry, ConstraintHandle};

    fn dummy_contact() -> ContactConstraint {
        // Zero bodies/points is fine: batch construction never touches the
        // constraint payload, only `bodies`.
        ContactConstraint::prestep(
            &dummy_body(),
            &dummy_body(),
            crate::math::Vector::y(),
            &[],
            Softness::HARD,
        )
    }

    fn dummy_body() -> crate::dynamics::rigid_body::RigidBody {
        use crate::dynamics::rigid_body::{BodyLocation, MassProperties, RigidBody, RigidBodyHandle};
        use crate::math::{Isometry, Matrix3x3, Vector};

        RigidBody {
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
        }
    }

    #[test]
    fn four_bodies_four_ring_constraints_color_into_two_batches() {
        // A 4-cycle (0-1, 1-2, 2-3, 3-0): alternating edges share no body,
        // so the graph is 2-colorable.
        let entries = vec![
            ConstraintEntry::contact(ConstraintHandle(0), 0, 1, dummy_contact()),
            ConstraintEntry::contact(ConstraintHandle(1), 1, 2, dummy_contact()),
            ConstraintEntry::contact(ConstraintHandle(2), 2, 3, dummy_contact()),
            ConstraintEntry::contact(ConstraintHandle(3), 3, 0, dummy_contact()),
        ];

        let batch_set = build_batches(&entries, 4, 32);

        assert_eq!(batch_set.batches.len(), 2);
        assert_eq!(batch_set.batches[0].constraint_indices.len(), 2);
        assert_eq!(batch_set.batches[1].constraint_indices.len(), 2);
        assert!(batch_set.fallback.is_none());
    }

    #[test]
    fn high_degree_body_routes_to_fallback() {
        let entries = vec![
            ConstraintEntry::contact(ConstraintHandle(0), 0, 1, dummy_contact()),
            ConstraintEntry::contact(ConstraintHandle(1), 0, 2, dummy_contact()),
            ConstraintEntry::contact(ConstraintHandle(2), 0, 3, dummy_contact()),
        ];

        let batch_set = build_batches(&entries, 4, 2);

        assert!(batch_set.fallback.is_some());
        assert_eq!(batch_set.fallback.unwrap().constraint_indices.len(), 3);
    }
}
