//! Small numeric helpers shared by the geometry and solver modules.
//!
//! The trait names (`WCross`, `WDot`, `WAngularInertia`, `WBasis`) and their
//! generic-over-`N` shape follow the teacher crate's own `utils` module: the
//! same trait works whether `N` is the scalar `Real` or the lane-wide
//! `SimdReal`, so prestep/solve kernels are written once and instantiated
//! twice (see `dynamics::solver`).

mod simd;

pub use simd::{recip, recip_sqrt, select};

use crate::math::{AngVector, Matrix3x3, Real, Vector};
use na::{SimdRealField, SimdValue};

/// The generalized cross product used to turn a lever arm + linear quantity
/// into an angular one (`r × v`).
pub trait WCross<Rhs> {
    type Result;
    fn gcross(&self, rhs: Rhs) -> Self::Result;
}

impl WCross<Vector> for Vector {
    type Result = AngVector;
    #[inline(always)]
    fn gcross(&self, rhs: Vector) -> AngVector {
        self.cross(&rhs)
    }
}

/// Computes the skew-symmetric cross-product matrix of a lever arm, i.e. the
/// linear map `v -> self x v`.
pub trait WCrossMatrix {
    type Result;
    fn gcross_matrix(&self) -> Self::Result;
}

impl WCrossMatrix for Vector {
    type Result = Matrix3x3;
    #[inline(always)]
    fn gcross_matrix(&self) -> Matrix3x3 {
        Matrix3x3::new(
            0.0, -self.z, self.y, //
            self.z, 0.0, -self.x, //
            -self.y, self.x, 0.0,
        )
    }
}

/// Generalized dot product, named to mirror `gcross` above.
pub trait WDot<Rhs> {
    type Result;
    fn gdot(&self, rhs: Rhs) -> Self::Result;
}

impl WDot<Vector> for Vector {
    type Result = Real;
    #[inline(always)]
    fn gdot(&self, rhs: Vector) -> Real {
        self.dot(&rhs)
    }
}

/// An orthonormal basis of the plane orthogonal to a (unit) direction.
///
/// Used by the contact constraint's friction prestep to build the tangent
/// directions from the contact normal (see `dynamics::solver::contact_constraint`).
pub trait WBasis: Sized {
    type Basis;
    fn orthonormal_basis(&self) -> Self::Basis;
    fn orthonormal_vector(&self) -> Self;
}

impl WBasis for Vector {
    type Basis = [Vector; 2];

    #[inline]
    fn orthonormal_basis(&self) -> [Vector; 2] {
        let a = self.orthonormal_vector();
        let b = self.cross(&a);
        [a, b]
    }

    #[inline]
    fn orthonormal_vector(&self) -> Vector {
        // Pick whichever axis is least aligned with `self` to avoid a
        // near-degenerate cross product.
        if self.x.abs() > self.y.abs() {
            Vector::new(-self.z, 0.0, self.x).normalize()
        } else {
            Vector::new(0.0, self.z, -self.y).normalize()
        }
    }
}

/// A world-space inverse inertia tensor, generic over scalar or SIMD-wide `N`.
///
/// `AngularInertia` is kept as a plain dense matrix rather than the teacher's
/// `SdpMatrix3` because this crate does not need the symmetric-storage
/// optimization to stay within its size budget; the operations it exposes
/// (`transform_vector`, `quadform`, `squared`) are the ones the solver and
/// joint-constraint prestep actually call.
#[derive(Copy, Clone, Debug)]
pub struct AngularInertia<N> {
    pub matrix: na::Matrix3<N>,
}

impl<N: SimdRealField + Copy> AngularInertia<N>
where
    N::Element: na::RealField,
{
    /// Builds the tensor from its dense matrix representation.
    #[inline]
    pub fn from_matrix(matrix: na::Matrix3<N>) -> Self {
        Self { matrix }
    }

    /// Applies the tensor to an angular quantity (e.g. `ii * torque -> angvel`).
    #[inline]
    pub fn transform_vector(&self, v: na::Vector3<N>) -> na::Vector3<N> {
        self.matrix * v
    }

    /// `self^2`, used when `world_inv_inertia_sqrt` is stored instead of the
    /// tensor itself (this halves the numerical error accumulated by
    /// repeated rotation of the tensor across frames, matching the teacher's
    /// own `world_inv_inertia_sqrt` field).
    #[inline]
    pub fn squared(&self) -> Self {
        Self {
            matrix: self.matrix * self.matrix,
        }
    }

    /// Computes `cmat^T * self * cmat`, i.e. the effective angular mass
    /// contribution of a lever-arm cross-product matrix.
    #[inline]
    pub fn quadform(&self, cmat: &na::Matrix3<N>) -> Self {
        Self {
            matrix: cmat.transpose() * self.matrix * *cmat,
        }
    }
}

/// Splats a scalar across every lane of a SIMD-wide value.
#[inline(always)]
pub fn splat<N: SimdValue<Element = Real> + Copy>(x: Real) -> N {
    N::splat(x)
}
