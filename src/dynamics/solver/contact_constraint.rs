//! Prestep/warm-start/solve kernels for a two-body contact constraint.
//!
//! Grounded on the `TwoBodyConstraint`/`VelocityConstraint` shape shared by
//! the `legendofa-rapier` and `DasEtwas-rapier` forks: one normal row per
//! contact point plus a two-axis friction row, solved with a projected
//! Gauss-Seidel pass (normal impulse clamped to `>= 0`, friction clamped to
//! a disc of radius `friction * normal_impulse`).

use crate::dynamics::rigid_body::RigidBody;
use crate::dynamics::solver::delta_vel::DeltaVel;
use crate::dynamics::solver::softness::Softness;
use crate::math::{Real, Vector};
use crate::utils::{WBasis, WCross};

/// One contact point's solver row, built once per step in [`ContactConstraint::prestep`]
/// and iterated over in [`ContactConstraint::solve`].
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    pub dist: Real,
    pub friction: Real,
    pub restitution: Real,

    r1: Vector,
    r2: Vector,
    normal_impulse: Real,
    tangent_impulse: [Real; 2],

    inv_effective_mass_normal: Real,
    inv_effective_mass_tangent: [Real; 2],
    /// The pre-solve closing velocity along the normal, used only by
    /// [`ContactConstraint::apply_restitution`]'s dedicated post-iteration
    /// pass, never folded into the main velocity-iteration target.
    initial_closing_velocity: Real,

    softness: Softness,
}

impl ContactPoint {
    /// This point's current accumulated normal/tangent impulses, for a
    /// caller that wants to persist them as the next frame's warm-start
    /// seed (see [`ContactConstraint::seed_warm_start`]).
    pub fn warm_start_state(&self) -> (Real, [Real; 2]) {
        (self.normal_impulse, self.tangent_impulse)
    }
}

/// A contact constraint between two bodies, sharing one normal across all
/// of its points.
pub struct ContactConstraint {
    pub normal: Vector,
    pub tangents: [Vector; 2],
    im1: Real,
    im2: Real,
    ii1: crate::utils::AngularInertia<Real>,
    ii2: crate::utils::AngularInertia<Real>,
    pub points: Vec<ContactPoint>,
}

impl ContactConstraint {
    /// Builds the constraint's effective masses and softness scalars from
    /// the current body state and a per-point depth/restitution/friction
    /// description. `offsets` are contact-point-minus-center-of-mass levers
    /// for each body, in world orientation.
    pub fn prestep(
        body1: &RigidBody,
        body2: &RigidBody,
        normal: Vector,
        contacts: &[(Vector, Vector, Real, Real, Real)], // (r1, r2, dist, friction, restitution)
        softness: Softness,
    ) -> Self {
        let tangents = normal.orthonormal_basis();
        let ii1 = body1.mass_properties.world_inv_inertia(&body1.position.rotation);
        let ii2 = body2.mass_properties.world_inv_inertia(&body2.position.rotation);
        let im1 = body1.mass_properties.inv_mass;
        let im2 = body2.mass_properties.inv_mass;

        let points = contacts
            .iter()
            .map(|&(r1, r2, dist, friction, restitution)| {
                let cross1 = r1.gcross(normal);
                let cross2 = r2.gcross(normal);
                let inv_mass_normal = im1 + im2
                    + ii1.transform_vector(cross1).dot(&cross1)
                    + ii2.transform_vector(cross2).dot(&cross2);

                let inv_effective_mass_tangent = tangents.map(|t| {
                    let c1 = r1.gcross(t);
                    let c2 = r2.gcross(t);
                    im1 + im2 + ii1.transform_vector(c1).dot(&c1) + ii2.transform_vector(c2).dot(&c2)
                });

                let initial_closing_velocity = (body2.velocity_at_point(r2) - body1.velocity_at_point(r1))
                    .dot(&normal);

                ContactPoint {
                    dist,
                    friction,
                    restitution,
                    r1,
                    r2,
                    normal_impulse: 0.0,
                    tangent_impulse: [0.0, 0.0],
                    inv_effective_mass_normal: crate::utils::recip(inv_mass_normal),
                    inv_effective_mass_tangent: inv_effective_mass_tangent.map(crate::utils::recip),
                    initial_closing_velocity,
                    softness,
                }
            })
            .collect();

        Self {
            normal,
            tangents,
            im1,
            im2,
            ii1,
            ii2,
            points,
        }
    }

    /// Seeds each point's accumulated impulse from a prior frame's solved
    /// state (e.g. decoded from the pair cache's persisted scratch), so the
    /// next call to [`warm_start`](Self::warm_start) is not a no-op. Points
    /// beyond `seeds`' length are left cold. Must be called after
    /// [`prestep`](Self::prestep), which always zero-inits impulses, and
    /// before `warm_start`/`solve`.
    pub fn seed_warm_start(&mut self, seeds: &[(Real, [Real; 2])]) {
        for (p, &(normal_impulse, tangent_impulse)) in self.points.iter_mut().zip(seeds) {
            p.normal_impulse = normal_impulse;
            p.tangent_impulse = tangent_impulse;
        }
    }

    /// Applies each point's warm-started impulse from the previous frame
    /// before the first velocity iteration.
    pub fn warm_start(&mut self, dv1: &mut DeltaVel<Real>, dv2: &mut DeltaVel<Real>) {
        for p in &self.points {
            let impulse = self.normal * p.normal_impulse
                + self.tangents[0] * p.tangent_impulse[0]
                + self.tangents[1] * p.tangent_impulse[1];
            apply_impulse(dv1, dv2, self.im1, self.im2, &self.ii1, &self.ii2, p.r1, p.r2, impulse);
        }
    }

    /// One projected Gauss-Seidel solve pass over every point: normal first
    /// (clamped to `>= 0`), then friction (clamped to the Coulomb disc
    /// scaled by the *updated* normal impulse, matching the teacher's
    /// normal-before-friction ordering).
    pub fn solve(&mut self, dv1: &mut DeltaVel<Real>, dv2: &mut DeltaVel<Real>) {
        for p in &mut self.points {
            let rel_vel = (dv2.linear + dv2.angular.gcross(p.r2)) - (dv1.linear + dv1.angular.gcross(p.r1));
            let normal_vel = rel_vel.dot(&self.normal);

            let bias = if p.dist < 0.0 {
                p.softness.position_error_to_velocity * p.dist
            } else {
                0.0
            };

            let impulse_delta = -p.inv_effective_mass_normal
                * p.softness.effective_mass_cfm_scale
                * (normal_vel + bias)
                - p.softness.softness_impulse_scale * p.normal_impulse;

            let new_impulse = (p.normal_impulse + impulse_delta).max(0.0);
            let applied = new_impulse - p.normal_impulse;
            p.normal_impulse = new_impulse;

            apply_impulse(
                dv1,
                dv2,
                self.im1,
                self.im2,
                &self.ii1,
                &self.ii2,
                p.r1,
                p.r2,
                self.normal * applied,
            );

            let max_friction = p.friction * p.normal_impulse;
            for axis in 0..2 {
                let t = self.tangents[axis];
                let rel_vel = (dv2.linear + dv2.angular.gcross(p.r2)) - (dv1.linear + dv1.angular.gcross(p.r1));
                let tangent_vel = rel_vel.dot(&t);

                let delta = -p.inv_effective_mass_tangent[axis] * tangent_vel;
                let new_tangent = (p.tangent_impulse[axis] + delta).clamp(-max_friction, max_friction);
                let applied = new_tangent - p.tangent_impulse[axis];
                p.tangent_impulse[axis] = new_tangent;

                apply_impulse(dv1, dv2, self.im1, self.im2, &self.ii1, &self.ii2, p.r1, p.r2, t * applied);
            }
        }
    }

    /// A dedicated pass run once after all velocity iterations have
    /// converged the main (zero-target) normal constraint: restores the
    /// fraction of the pre-solve closing velocity the point's restitution
    /// coefficient calls for, skipped when that velocity never exceeded
    /// `velocity_threshold` (resting contacts shouldn't bounce on
    /// numerical noise).
    pub fn apply_restitution(&mut self, dv1: &mut DeltaVel<Real>, dv2: &mut DeltaVel<Real>, velocity_threshold: Real) {
        for p in &mut self.points {
            if p.restitution == 0.0 || -p.initial_closing_velocity <= velocity_threshold {
                continue;
            }

            let rel_vel = (dv2.linear + dv2.angular.gcross(p.r2)) - (dv1.linear + dv1.angular.gcross(p.r1));
            let normal_vel = rel_vel.dot(&self.normal);
            let target = -p.restitution * p.initial_closing_velocity;

            let impulse_delta = -p.inv_effective_mass_normal * (normal_vel - target);
            let new_impulse = (p.normal_impulse + impulse_delta).max(0.0);
            let applied = new_impulse - p.normal_impulse;
            p.normal_impulse = new_impulse;

            apply_impulse(dv1, dv2, self.im1, self.im2, &self.ii1, &self.ii2, p.r1, p.r2, self.normal * applied);
        }
    }
}

#[inline]
fn apply_impulse(
    dv1: &mut DeltaVel<Real>,
    dv2: &mut DeltaVel<Real>,
    im1: Real,
    im2: Real,
    ii1: &crate::utils::AngularInertia<Real>,
    ii2: &crate::utils::AngularInertia<Real>,
    r1: Vector,
    r2: Vector,
    impulse: Vector,
) {
    dv1.linear -= impulse * im1;
    dv1.angular -= ii1.transform_vector(r1.gcross(impulse));
    dv2.linear += impulse * im2;
    dv2.angular += ii2.transform_vector(r2.gcross(impulse));
}
