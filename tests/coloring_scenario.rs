//! Scenario 6 (§8): 4 bodies with constraints {(A,B), (C,D), (A,C), (B,D)}
//! color into 2 batches of 2 constraints each, with no body repeated
//! within a batch.

use narrowphase3d::dynamics::rigid_body::{BodyLocation, MassProperties, RigidBody, RigidBodyHandle};
use narrowphase3d::dynamics::solver::batch::build_batches;
use narrowphase3d::dynamics::solver::contact_constraint::ContactConstraint;
use narrowphase3d::dynamics::solver::softness::Softness;
use narrowphase3d::dynamics::solver::{ConstraintEntry, ConstraintHandle};
use narrowphase3d::math::{Isometry, Matrix3x3, Vector};

fn body() -> RigidBody {
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

fn contact() -> ContactConstraint {
    ContactConstraint::prestep(&body(), &body(), Vector::y(), &[], Softness::HARD)
}

const A: usize = 0;
const B: usize = 1;
const C: usize = 2;
const D: usize = 3;

#[test]
fn four_bodies_with_the_scenario_six_edge_set_color_into_two_batches() {
    let entries = vec![
        ConstraintEntry::contact(ConstraintHandle(0), A, B, contact()),
        ConstraintEntry::contact(ConstraintHandle(1), C, D, contact()),
        ConstraintEntry::contact(ConstraintHandle(2), A, C, contact()),
        ConstraintEntry::contact(ConstraintHandle(3), B, D, contact()),
    ];

    let batch_set = build_batches(&entries, 4, 32);

    assert!(batch_set.fallback.is_none());
    assert_eq!(batch_set.batches.len(), 2);
    for batch in &batch_set.batches {
        assert_eq!(batch.constraint_indices.len(), 2);

        let mut seen = Vec::new();
        for &index in &batch.constraint_indices {
            for &b in entries[index].bodies.as_slice() {
                assert!(!seen.contains(&b), "body {b} appears twice in one batch");
                seen.push(b);
            }
        }
    }
}
