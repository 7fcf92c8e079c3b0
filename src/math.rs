//! Lane-width-generic math aliases shared by every module in this crate.
//!
//! Mirrors the teacher crate's `math.rs`: a handful of type aliases over `nalgebra`
//! so the rest of the crate is generic over a single-lane `Real` and, when the
//! `simd-is-enabled` feature is on, a `SIMD_WIDTH`-wide `SimdReal`.

use na::{Isometry3, Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// The scalar floating point type used everywhere outside SIMD bundles.
pub type Real = f32;

/// A 3D point in either a shape's local space or the world.
pub type Point = Point3<Real>;

/// A 3D vector: displacement, velocity, normal, or support-mapping direction.
pub type Vector = Vector3<Real>;

/// An angular velocity / torque pseudo-vector.
pub type AngVector = Vector3<Real>;

/// A unit orientation.
pub type Rotation = UnitQuaternion<Real>;

/// A raw (non-unit) quaternion, used for integrating orientation derivatives.
pub type RawQuaternion = Quaternion<Real>;

/// A rigid transform: position + orientation.
pub type Isometry = Isometry3<Real>;

/// A dense 3x3 matrix, used for world-space inverse inertia tensors.
pub type Matrix3x3 = Matrix3<Real>;

#[cfg(feature = "simd-is-enabled")]
pub use simd::*;

#[cfg(feature = "simd-is-enabled")]
mod simd {
    /// Number of lanes packed into one SIMD bundle.
    ///
    /// This is a compile-time constant, not the runtime `lane_width` configuration
    /// field: the two must agree, and `IntegrationParameters::lane_width` exists for
    /// introspection/logging rather than to drive codegen.
    pub const SIMD_WIDTH: usize = 4;

    /// The SIMD-wide scalar type used by bundle kernels.
    pub type SimdReal = simba::simd::f32x4;
}

#[cfg(not(feature = "simd-is-enabled"))]
pub const SIMD_WIDTH: usize = 1;

/// `termination_epsilon` is squared before comparing against the squared distance
/// from the search target to its projected closest point (see
/// `geometry::depth_refiner`); this avoids a square root in the hot loop.
#[inline(always)]
pub fn squared(x: Real) -> Real {
    x * x
}
