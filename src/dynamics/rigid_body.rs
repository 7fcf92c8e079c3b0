//! Rigid body storage: a stable handle plus the set-relative location used
//! by the solver to index into per-set velocity/position buffers (§7).
//!
//! Set 0 is always the active set; every other set index is a sleeping
//! island, parked out of the solver's hot loop until woken.

use crate::geometry::{Collidable, ShapeIndex};
use crate::math::{AngVector, Isometry, Matrix3x3, Real, Vector};
use crate::utils::AngularInertia;

/// A stable, generation-checked reference to a body, independent of its
/// current set/slot (which changes as it sleeps, wakes, or is removed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Where a body currently lives: which set (0 = active, N>0 = a sleeping
/// island) and which slot within that set's dense buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyLocation {
    pub set: usize,
    pub slot: usize,
}

impl BodyLocation {
    pub const ACTIVE_SET: usize = 0;

    #[inline]
    pub fn is_active(&self) -> bool {
        self.set == Self::ACTIVE_SET
    }
}

/// Mass and inertia, precomputed in both local and (for inertia) world space;
/// the world-space inertia is refreshed once per step from the body's pose.
#[derive(Clone, Copy, Debug)]
pub struct MassProperties {
    pub local_com: Vector,
    pub inv_mass: Real,
    pub local_inv_inertia: Matrix3x3,
}

impl MassProperties {
    /// Rotates the local inverse inertia tensor into world space:
    /// `R * I^-1 * R^T`.
    #[inline]
    pub fn world_inv_inertia(&self, orientation: &crate::math::Rotation) -> AngularInertia<Real> {
        let r = orientation.to_rotation_matrix().into_inner();
        AngularInertia::from_matrix(r * self.local_inv_inertia * r.transpose())
    }
}

/// A single rigid body.
pub struct RigidBody {
    pub handle: RigidBodyHandle,
    pub location: BodyLocation,
    pub position: Isometry,
    pub linvel: Vector,
    pub angvel: AngVector,
    pub mass_properties: MassProperties,
    pub collidable: Option<(ShapeIndex, Collidable)>,
}

impl RigidBody {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.mass_properties.inv_mass == 0.0
    }

    /// World-space linear velocity at a point offset from the body's center
    /// of mass: `v + w x r`.
    #[inline]
    pub fn velocity_at_point(&self, offset_from_com: Vector) -> Vector {
        self.linvel + self.angvel.cross(&offset_from_com)
    }
}
