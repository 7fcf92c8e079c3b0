//! Global tuning knobs for one simulation step: timestep, solver iteration
//! counts, softness defaults, and the depth-refiner/batcher parameters this
//! crate adds on top of the teacher's own integration parameters.

use crate::geometry::DepthRefinerConfig;
use crate::math::{Real, SIMD_WIDTH};

#[derive(Clone, Copy, Debug)]
pub struct IntegrationParameters {
    /// Simulation timestep, in seconds.
    pub dt: Real,
    /// Minimum timestep a CCD substep is allowed to shrink to before the
    /// substepping continuity mode gives up and accepts the penetration.
    pub min_ccd_dt: Real,

    /// Default contact constraint softness, as an error-reduction parameter
    /// (fraction of position error corrected per step).
    pub erp: Real,
    /// Default joint constraint softness.
    pub joint_erp: Real,
    /// Maximum distance a single step's position correction may cover, to
    /// avoid overshoot on deep penetrations.
    pub max_penetration_correction: Real,
    /// Speculative contact margin added to the AABB so the narrow phase can
    /// report near-misses before they'd otherwise overlap (§6).
    pub prediction_distance: Real,

    /// Number of velocity-iteration passes per step over every constraint
    /// set/batch (§4.7).
    pub velocity_iteration_count: u32,
    /// Additional passes dedicated solely to friction, after the main
    /// velocity iterations have converged the normal impulses.
    pub additional_friction_iterations: u32,
    /// Closing-velocity magnitude below which restitution is not applied,
    /// avoiding energy injection from numerical noise on resting contacts.
    pub restitution_velocity_threshold: Real,

    /// Number of SIMD lanes per bundle; must equal
    /// [`crate::math::SIMD_WIDTH`] and exists for introspection/logging
    /// rather than to drive codegen.
    pub lane_width: usize,
    /// A body's constraint degree above which it is moved to the fallback
    /// (Jacobi) batch instead of being colored into the main batch set (§4.7).
    pub fallback_batch_threshold: u32,

    pub depth_refiner_max_iterations: u32,
    pub convergence_threshold: Real,
    pub minimum_depth_threshold: Real,
}

impl IntegrationParameters {
    /// Extracts the subset of fields the depth refiner cares about.
    pub fn depth_refiner_config(&self) -> DepthRefinerConfig {
        DepthRefinerConfig {
            max_iterations: self.depth_refiner_max_iterations,
            convergence_threshold: self.convergence_threshold,
            minimum_depth_threshold: self.minimum_depth_threshold,
        }
    }
}

impl Default for IntegrationParameters {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            min_ccd_dt: 1.0 / 60.0 / 100.0,
            erp: 0.2,
            joint_erp: 1.0,
            max_penetration_correction: Real::MAX,
            prediction_distance: 0.002,
            velocity_iteration_count: 4,
            additional_friction_iterations: 0,
            restitution_velocity_threshold: 1.0,
            lane_width: SIMD_WIDTH,
            fallback_batch_threshold: 32,
            depth_refiner_max_iterations: 50,
            convergence_threshold: 1.0e-4,
            minimum_depth_threshold: -0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_width_matches_compile_time_simd_width() {
        assert_eq!(IntegrationParameters::default().lane_width, SIMD_WIDTH);
    }
}
