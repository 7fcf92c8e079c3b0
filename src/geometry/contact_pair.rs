//! Per-pair contact state held across frames: the manifold(s) produced by
//! the narrow phase plus the solver-facing contact data derived from them.
//!
//! Grounded on the teacher's `geometry::contact_pair` module, adapted to
//! this crate's [`PairId`]/[`ContactManifold`] types in place of the
//! teacher's `ColliderPair`/external collision-manifold workspace.

use bitflags::bitflags;

use crate::geometry::collider::PairId;
use crate::geometry::contact_manifold::ContactManifold;
use crate::math::{Real, Vector};

bitflags! {
    /// Flags affecting the behavior of the constraint solver for a given
    /// contact manifold.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct SolverFlags: u32 {
        /// The solver takes this manifold into account for impulse computation.
        const COMPUTE_IMPULSES = 0b01;
        /// This pair's continuity mode requires the CCD pass to revisit it (§10.5).
        const CONTINUOUS = 0b10;
    }
}

impl Default for SolverFlags {
    fn default() -> Self {
        SolverFlags::COMPUTE_IMPULSES
    }
}

/// Per-contact solver state: accumulated impulse magnitudes, separate from
/// the manifold's geometric [`crate::geometry::contact_manifold::Contact`]
/// so geometry queries never need to touch solver bookkeeping.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactData {
    /// Impulse along the contact normal applied to the first collidable's
    /// body; the impulse applied to the second is `-impulse`.
    pub impulse: Real,
    /// Friction impulses along the tangent basis orthonormal to the normal.
    pub tangent_impulse: [Real; 2],
}

impl Default for ContactData {
    fn default() -> Self {
        Self {
            impulse: 0.0,
            tangent_impulse: [0.0, 0.0],
        }
    }
}

/// All state the narrow phase tracks for one collidable pair across frames.
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactPair {
    pub pair: PairId,
    /// The set of contact manifolds between the two collidables.
    pub manifolds: Vec<ContactManifold>,
    pub has_any_active_contact: bool,
    pub solver_flags: SolverFlags,
}

impl ContactPair {
    pub fn new(pair: PairId) -> Self {
        Self {
            pair,
            manifolds: Vec::new(),
            has_any_active_contact: false,
            solver_flags: SolverFlags::default(),
        }
    }

    /// Replaces this frame's manifolds, warm-starting each one from the
    /// manifold at the same index in the previous frame's set (manifolds
    /// are not reordered across frames for a given pair).
    pub fn update_manifolds(&mut self, mut new_manifolds: Vec<ContactManifold>) {
        for (i, manifold) in new_manifolds.iter_mut().enumerate() {
            if let Some(previous) = self.manifolds.get(i) {
                manifold.warm_start_from(previous);
            }
        }
        self.has_any_active_contact = new_manifolds.iter().any(|m| !m.is_empty());
        self.manifolds = new_manifolds;
    }

    /// The separating-axis normal of the first non-empty manifold, for
    /// callers that only need one representative contact normal.
    pub fn representative_normal(&self) -> Option<Vector> {
        self.manifolds
            .iter()
            .find(|m| !m.is_empty())
            .map(|m| m.normal)
    }
}

/// Reduction applied to warm-started impulses right after a contact
/// reappears following a high-velocity impact, increasing exponentially
/// back to 1.0 over subsequent frames to damp overshoot (teacher pattern,
/// currently fixed at 1.0 pending the velocity-spike heuristic).
pub(crate) fn min_warmstart_multiplier() -> Real {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::collider::{ColliderRef, Mobility};
    use crate::geometry::contact_manifold::Contact;
    use crate::math::Vector;

    fn pair() -> PairId {
        PairId::canonicalize(
            ColliderRef::new(1, Mobility::Dynamic),
            ColliderRef::new(2, Mobility::Dynamic),
        )
        .unwrap()
    }

    #[test]
    fn warm_start_carries_over_matching_feature_ids() {
        let mut contact_pair = ContactPair::new(pair());

        let mut first = ContactManifold::new(Vector::y());
        let mut c = Contact::new(Vector::zeros(), Vector::zeros(), 0.1, 7);
        c.normal_impulse = 3.0;
        first.contacts.push(c);
        contact_pair.update_manifolds(vec![first]);

        let mut second = ContactManifold::new(Vector::y());
        second
            .contacts
            .push(Contact::new(Vector::zeros(), Vector::zeros(), 0.09, 7));
        contact_pair.update_manifolds(vec![second]);

        assert_eq!(contact_pair.manifolds[0].contacts[0].normal_impulse, 3.0);
        assert!(contact_pair.has_any_active_contact);
    }
}
