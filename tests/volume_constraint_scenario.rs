//! Scenario 3: a regular tetrahedron of side 1 at its rest volume — the
//! bias term must start at zero and the accumulated impulse must stay near
//! zero across iterations (nothing to correct).

use narrowphase3d::dynamics::solver::softness::Softness;
use narrowphase3d::dynamics::solver::volume_constraint::VolumeConstraint;
use narrowphase3d::dynamics::solver::DeltaVel;
use narrowphase3d::math::Vector;

fn regular_tetrahedron_side_one() -> [Vector; 4] {
    // A side-1 regular tetrahedron, one standard coordinate placement.
    [
        Vector::new(0.0, 0.0, 0.0),
        Vector::new(1.0, 0.0, 0.0),
        Vector::new(0.5, (3f32).sqrt() / 2.0, 0.0),
        Vector::new(0.5, (3f32).sqrt() / 6.0, (6f32).sqrt() / 3.0),
    ]
}

#[test]
fn at_rest_volume_impulse_stays_near_zero() {
    let positions = regular_tetrahedron_side_one();
    let rest_volume = 6.0 * (2f32).sqrt() / 12.0;

    let mut constraint = VolumeConstraint::prestep(positions, [1.0; 4], rest_volume, Softness::HARD);
    let mut deltas = [DeltaVel::zero(); 4];

    for _ in 0..10 {
        constraint.solve(positions, &mut deltas);
    }

    for d in &deltas {
        assert!(d.linear.norm() < 1.0e-3, "delta = {:?}", d.linear);
    }
}
