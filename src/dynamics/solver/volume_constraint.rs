//! The four-body volume constraint worked example (§4.6): keeps the signed
//! *scaled* volume (the raw scalar triple product `ab . (ac x ad)`, six
//! times the tetrahedron's actual volume) of `A B C D` equal to a rest
//! value, distributing the correction across all four vertices via the
//! Jacobian
//!
//! ```text
//! J_B = ac x ad
//! J_C = ad x ab
//! J_D = ab x ac
//! J_A = -(J_B + J_C + J_D)
//! ```
//!
//! where `ab = b - a`, `ac = c - a`, `ad = d - a`. This is the one
//! constraint type in this crate with more than two bodies, exercising the
//! same `DeltaVel`/softness plumbing the two-body contact constraint uses.

use crate::dynamics::rigid_body::RigidBody;
use crate::dynamics::solver::delta_vel::DeltaVel;
use crate::dynamics::solver::softness::Softness;
use crate::math::{Real, Vector};
use crate::utils::recip;

pub struct VolumeConstraint {
    /// The target *scaled* volume (six times the actual tetrahedron volume).
    pub rest_volume: Real,
    im: [Real; 4],
    jacobian: [Vector; 4],
    inv_effective_mass: Real,
    softness: Softness,
    total_impulse: Real,
}

impl VolumeConstraint {
    /// `positions` are the four vertices in `A, B, C, D` order; `inv_masses`
    /// in the same order.
    pub fn prestep(positions: [Vector; 4], inv_masses: [Real; 4], rest_volume: Real, softness: Softness) -> Self {
        let jacobian = Self::jacobian(positions);

        let inv_effective_mass_raw = inv_masses
            .iter()
            .zip(jacobian.iter())
            .map(|(&im, j)| im * j.norm_squared())
            .sum::<Real>();

        Self {
            rest_volume,
            im: inv_masses,
            jacobian,
            inv_effective_mass: recip(inv_effective_mass_raw),
            softness,
            total_impulse: 0.0,
        }
    }

    fn jacobian(positions: [Vector; 4]) -> [Vector; 4] {
        let [a, b, c, d] = positions;
        let ab = b - a;
        let ac = c - a;
        let ad = d - a;

        let j_b = ac.cross(&ad);
        let j_c = ad.cross(&ab);
        let j_d = ab.cross(&ac);
        let j_a = -(j_b + j_c + j_d);

        [j_a, j_b, j_c, j_d]
    }

    /// The scaled (6x) signed volume consistent with the `jacobian` above:
    /// the raw triple product, with no division by 6.
    fn current_volume(positions: [Vector; 4]) -> Real {
        let [a, b, c, d] = positions;
        (b - a).cross(&(c - a)).dot(&(d - a))
    }

    /// One Gauss-Seidel solve pass: `deltas` holds each body's accumulated
    /// `DeltaVel`, `positions` the current (pre-correction) vertex
    /// positions used to compute the signed volume error.
    pub fn solve(&mut self, positions: [Vector; 4], deltas: &mut [DeltaVel<Real>; 4]) {
        let current_volume = Self::current_volume(positions);
        let error = current_volume - self.rest_volume;

        let c_dot = (0..4)
            .map(|i| self.jacobian[i].dot(&deltas[i].linear))
            .sum::<Real>();

        let bias = self.softness.position_error_to_velocity * error;

        let impulse_delta = -self.inv_effective_mass
            * self.softness.effective_mass_cfm_scale
            * (c_dot + bias)
            - self.softness.softness_impulse_scale * self.total_impulse;

        self.total_impulse += impulse_delta;

        for i in 0..4 {
            deltas[i].linear += self.jacobian[i] * (self.im[i] * impulse_delta);
        }
    }
}

pub(crate) fn bodies_as_positions(bodies: [&RigidBody; 4]) -> [Vector; 4] {
    bodies.map(|b| b.position.translation.vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_a_is_negative_sum_of_others() {
        let positions = [
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            Vector::new(0.0, 0.0, 1.0),
        ];
        let j = VolumeConstraint::jacobian(positions);
        assert!((j[0] + (j[1] + j[2] + j[3])).norm() < 1.0e-6);
    }

    #[test]
    fn solve_drives_volume_toward_rest() {
        let positions = [
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(2.0, 0.0, 0.0),
            Vector::new(0.0, 2.0, 0.0),
            Vector::new(0.0, 0.0, 2.0),
        ];
        // Scaled rest volume of the unit tetrahedron, smaller than the larger one above.
        let rest_volume = Vector::new(1.0, 0.0, 0.0)
            .cross(&Vector::new(0.0, 1.0, 0.0))
            .dot(&Vector::new(0.0, 0.0, 1.0));
        let initial_error = (VolumeConstraint::current_volume(positions) - rest_volume).abs();

        let mut constraint = VolumeConstraint::prestep(positions, [1.0; 4], rest_volume, Softness::HARD);
        let mut deltas = [DeltaVel::zero(); 4];
        for _ in 0..8 {
            constraint.solve(positions, &mut deltas);
        }

        let projected: [Vector; 4] = std::array::from_fn(|i| positions[i] + deltas[i].linear * 0.01);
        let corrected_error = (VolumeConstraint::current_volume(projected) - rest_volume).abs();
        assert!(corrected_error < initial_error);
    }
}
