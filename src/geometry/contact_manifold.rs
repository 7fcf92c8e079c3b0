//! Contact manifold data produced by the narrow phase for a single pair
//! (§3): up to four contacts sharing one separating-axis normal, each
//! carrying a stable feature id so the solver can warm-start impulses
//! across frames even as the manifold is rebuilt.

use arrayvec::ArrayVec;

use crate::math::{Point, Real, Vector};

/// Maximum simultaneous contact points tracked per manifold (§3).
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// An id identifying which feature pair (vertex/edge/face combination)
/// produced a contact point, stable across frames for the same geometric
/// feature so warm-started impulses carry over even as points are added or
/// dropped.
pub type FeatureId = u32;

/// A single point of contact within a manifold.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    /// Contact point relative to collidable A's origin, in world orientation.
    pub offset_a: Vector,
    /// Contact point relative to collidable B's origin, in world orientation.
    pub offset_b: Vector,
    /// Signed penetration depth along the manifold normal; negative is
    /// separated (speculative contact within the margin, §6).
    pub depth: Real,
    pub feature_id: FeatureId,
    /// Warm-started normal and tangent impulse magnitudes, carried from the
    /// previous frame's solve via the pair cache.
    pub normal_impulse: Real,
    pub tangent_impulse: [Real; 2],
}

impl Contact {
    pub fn new(offset_a: Vector, offset_b: Vector, depth: Real, feature_id: FeatureId) -> Self {
        Self {
            offset_a,
            offset_b,
            depth,
            feature_id,
            normal_impulse: 0.0,
            tangent_impulse: [0.0, 0.0],
        }
    }

    /// Copies warm-startable impulse state from `previous` when their
    /// feature ids match; otherwise the contact starts cold.
    pub fn warm_start_from(&mut self, previous: &[Contact]) {
        if let Some(prev) = previous.iter().find(|c| c.feature_id == self.feature_id) {
            self.normal_impulse = prev.normal_impulse;
            self.tangent_impulse = prev.tangent_impulse;
        }
    }
}

/// The result of one narrow-phase query between two collidables: a shared
/// separating-axis normal (pointing from A to B) plus up to
/// [`MAX_MANIFOLD_POINTS`] contacts.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactManifold {
    pub normal: Vector,
    pub contacts: ArrayVec<Contact, MAX_MANIFOLD_POINTS>,
}

impl ContactManifold {
    pub fn new(normal: Vector) -> Self {
        Self {
            normal,
            contacts: ArrayVec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Transfers warm-start impulses from the previous frame's manifold by
    /// matching feature ids, leaving unmatched contacts cold.
    pub fn warm_start_from(&mut self, previous: &ContactManifold) {
        for contact in &mut self.contacts {
            contact.warm_start_from(&previous.contacts);
        }
    }

    /// The deepest contact's point, used as the fallback support origin
    /// when seeding a depth refiner from a previous manifold (§4.3 step 1).
    pub fn deepest_point(&self) -> Option<Point> {
        self.contacts
            .iter()
            .max_by(|a, b| a.depth.partial_cmp(&b.depth).unwrap())
            .map(|c| Point::from(c.offset_a))
    }
}
