//! The per-body velocity correction accumulated by one solver pass before
//! being added back into the body's actual velocity. Generic over `N` so
//! the same prestep/solve kernels instantiate once for the scalar `Real`
//! path and once for `SimdReal` bundles (§4.1).

use na::{Scalar, SimdRealField, Vector3};

#[derive(Copy, Clone, Debug)]
pub struct DeltaVel<N: Scalar + Copy> {
    pub linear: Vector3<N>,
    pub angular: Vector3<N>,
}

impl<N: SimdRealField + Copy> DeltaVel<N> {
    pub fn zero() -> Self {
        Self {
            linear: na::zero(),
            angular: na::zero(),
        }
    }

    #[inline]
    pub fn add_assign(&mut self, other: &Self) {
        self.linear += other.linear;
        self.angular += other.angular;
    }
}
