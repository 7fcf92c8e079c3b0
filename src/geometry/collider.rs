//! Collidable references, pair identity and canonicalization, and the
//! `handle_overlap` broad-phase/narrow-phase boundary (§6).

use crate::error::{NarrowPhaseError, NarrowPhaseResult};

/// How a body moves, carried alongside its handle so canonicalization and
/// the static-static precondition can be checked without a storage lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Mobility {
    Dynamic,
    Kinematic,
    Static,
}

impl Mobility {
    #[inline]
    pub fn is_static(self) -> bool {
        matches!(self, Mobility::Static)
    }
}

/// A packed reference to a collidable: a stable handle plus its mobility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ColliderRef {
    pub handle: u32,
    pub mobility: Mobility,
}

impl ColliderRef {
    #[inline]
    pub fn new(handle: u32, mobility: Mobility) -> Self {
        Self { handle, mobility }
    }

    /// The packed bit pattern used for the `a.packed != b.packed`
    /// precondition and for ordering during canonicalization.
    #[inline]
    fn packed(&self) -> u64 {
        ((self.mobility as u64) << 32) | self.handle as u64
    }
}

/// An unordered pair of collidables, canonicalized so that:
/// (a) statics always occupy the second slot, and
/// (b) between two non-static collidables, the lower-handle one occupies
///     the first slot, independent of mobility.
///
/// Canonicalization is total and stable across frames, making `PairId` the
/// persistence key for the pair cache (§3, §8 scenario 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PairId {
    pub first: ColliderRef,
    pub second: ColliderRef,
}

impl PairId {
    pub fn canonicalize(a: ColliderRef, b: ColliderRef) -> NarrowPhaseResult<Self> {
        if a.packed() == b.packed() {
            return Err(NarrowPhaseError::SelfPair);
        }
        if a.mobility.is_static() && b.mobility.is_static() {
            return Err(NarrowPhaseError::StaticStaticPair);
        }

        let (first, second) = match (a.mobility.is_static(), b.mobility.is_static()) {
            (true, false) => (b, a),
            (false, true) => (a, b),
            // Neither is static: order by handle alone (§3), independent of
            // mobility — `packed()` folds mobility into the high bits and is
            // only meaningful for the self-pair/static-static precondition
            // checks above, not for this ordering.
            _ => {
                if a.handle <= b.handle {
                    (a, b)
                } else {
                    (b, a)
                }
            }
        };

        Ok(Self { first, second })
    }
}

/// A type id distinguishing pair *shapes* (ball-ball, ball-cuboid, ...), used
/// by the collision batcher to key bundles (§4.5) and by the constraint
/// processor to dispatch kernels by type id rather than virtual call (§9).
pub type PairTypeId = u16;

/// The entry point from the broad phase: reports a single candidate overlap.
///
/// `worker_index` identifies which worker-local batcher/pending-add list
/// this call should append to; the broad phase is expected to call this
/// concurrently from many workers, each with a distinct `worker_index`.
pub fn handle_overlap(
    worker_index: usize,
    a: ColliderRef,
    b: ColliderRef,
) -> NarrowPhaseResult<(usize, PairId)> {
    // Cheap in release (the broad phase should never report these), checked
    // for free in debug builds on top of the `Result` every caller still
    // gets.
    debug_assert_ne!(a.packed(), b.packed(), "broad phase reported a collidable against itself");
    debug_assert!(
        !(a.mobility.is_static() && b.mobility.is_static()),
        "broad phase reported a static-static pair"
    );

    let pair = PairId::canonicalize(a, b)?;
    Ok((worker_index, pair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_is_symmetric() {
        let a = ColliderRef::new(7, Mobility::Dynamic);
        let b = ColliderRef::new(3, Mobility::Dynamic);

        let (_, pair_ab) = handle_overlap(0, a, b).unwrap();
        let (_, pair_ba) = handle_overlap(0, b, a).unwrap();

        assert_eq!(pair_ab, pair_ba);
    }

    #[test]
    fn non_static_ordering_is_by_handle_not_mobility() {
        // A low-handle Kinematic against a high-handle Dynamic: ordering
        // must follow the handle alone, not `mobility as u64` folded into
        // the high bits of `packed()`.
        let kinematic = ColliderRef::new(1, Mobility::Kinematic);
        let dynamic = ColliderRef::new(100, Mobility::Dynamic);

        let pair = PairId::canonicalize(kinematic, dynamic).unwrap();
        assert_eq!(pair.first, kinematic);
        assert_eq!(pair.second, dynamic);
    }

    #[test]
    fn statics_always_second() {
        let dynamic = ColliderRef::new(1, Mobility::Dynamic);
        let st = ColliderRef::new(0, Mobility::Static);

        let pair = PairId::canonicalize(st, dynamic).unwrap();
        assert_eq!(pair.first, dynamic);
        assert_eq!(pair.second, st);
    }

    #[test]
    fn rejects_static_static() {
        let a = ColliderRef::new(1, Mobility::Static);
        let b = ColliderRef::new(2, Mobility::Static);
        assert_eq!(
            PairId::canonicalize(a, b),
            Err(NarrowPhaseError::StaticStaticPair)
        );
    }

    #[test]
    fn rejects_self_pair() {
        let a = ColliderRef::new(1, Mobility::Dynamic);
        assert_eq!(PairId::canonicalize(a, a), Err(NarrowPhaseError::SelfPair));
    }
}
