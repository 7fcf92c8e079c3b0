//! Minkowski-difference support mapping between two collidables, expressed
//! in shape A's local frame, per §4.2:
//!
//! `support_A(d) − (R_{B→A} · support_B(−R_{A→B}·d) + offset_{B in A})`

use crate::geometry::shape::{ConvexShape, SupportMap};
use crate::math::{Isometry, Point, Vector};

/// The relative pose of B expressed in A's local frame, precomputed once per
/// pair so repeated support queries during depth refinement don't redo the
/// isometry composition.
#[derive(Clone, Copy, Debug)]
pub struct RelativePose {
    /// `pose_a.inverse() * pose_b`
    pub b_in_a: Isometry,
}

impl RelativePose {
    #[inline]
    pub fn new(pose_a: &Isometry, pose_b: &Isometry) -> Self {
        Self {
            b_in_a: pose_a.inverse() * pose_b,
        }
    }
}

/// Returns the Minkowski-difference support of `(a, b)` along `dir`, with
/// `dir` expressed in `a`'s local frame and the result expressed in the same
/// frame. A single bundle may evaluate this independently per lane for
/// different `(a, b, dir)` instances — there is no shared state between
/// calls.
#[inline]
pub fn minkowski_support(
    a: &ConvexShape,
    b: &ConvexShape,
    rel: &RelativePose,
    dir: &Vector,
) -> Point {
    let support_a = a.local_support_point(dir);

    let dir_in_b = rel.b_in_a.inverse_transform_vector(&(-dir));
    let support_b_local = b.local_support_point(&dir_in_b);
    let support_b_in_a = rel.b_in_a.transform_point(&support_b_local);

    support_a - support_b_in_a.coords
}
