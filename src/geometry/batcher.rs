//! Groups pending pairs into fixed-capacity, W-wide bundles keyed by pair
//! type so the geometry stage can process `SIMD_WIDTH` independent problems
//! per bundle (§4.1, §4.5).
//!
//! Two-phase drain: while the broad phase is still feeding pairs, only
//! *full* bundles are handed off for processing (phase 1). Once the broad
//! phase is done for the frame, [`CollisionBatcher::flush`] drains every
//! remaining non-empty bundle, including any spawned sub-pairs a compound
//! expansion produced mid-frame (phase 2).

use std::collections::HashMap;

use arrayvec::ArrayVec;

use crate::geometry::collider::PairTypeId;
use crate::math::SIMD_WIDTH;

/// A bundle of up to `SIMD_WIDTH` pending items of the same pair type.
pub struct Bundle<T> {
    items: ArrayVec<T, SIMD_WIDTH>,
}

impl<T> Bundle<T> {
    fn new() -> Self {
        Self {
            items: ArrayVec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == SIMD_WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for Bundle<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates pending items of type `T` into per-pair-type bundles and
/// yields full (or, at flush time, partial) bundles for processing.
pub struct CollisionBatcher<T> {
    bundles: HashMap<PairTypeId, Bundle<T>>,
}

impl<T> CollisionBatcher<T> {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Appends `item` to the bundle for `type_id`. If the bundle becomes
    /// full, it is removed and returned for immediate processing (phase 1);
    /// otherwise `None` is returned and the item stays buffered.
    pub fn push(&mut self, type_id: PairTypeId, item: T) -> Option<Bundle<T>> {
        let bundle = self.bundles.entry(type_id).or_insert_with(Bundle::new);
        bundle.items.push(item);
        if bundle.is_full() {
            self.bundles.remove(&type_id)
        } else {
            None
        }
    }

    /// Phase 2: drains every non-empty bundle regardless of fill level,
    /// including bundles refilled by sub-pairs spawned during phase 1
    /// (e.g. compound expansion). Called once the broad phase has finished
    /// reporting pairs for the frame.
    pub fn flush(&mut self) -> Vec<(PairTypeId, Bundle<T>)> {
        let type_ids: Vec<PairTypeId> = self
            .bundles
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(id, _)| *id)
            .collect();

        type_ids
            .into_iter()
            .filter_map(|id| self.bundles.remove(&id).map(|b| (id, b)))
            .collect()
    }

    pub fn pending_type_ids(&self) -> impl Iterator<Item = &PairTypeId> {
        self.bundles.keys()
    }
}

impl<T> Default for CollisionBatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bundle_is_returned_immediately() {
        let mut batcher: CollisionBatcher<u32> = CollisionBatcher::new();
        for i in 0..SIMD_WIDTH as u32 - 1 {
            assert!(batcher.push(0, i).is_none());
        }
        let full = batcher.push(0, 999);
        assert!(full.is_some());
        assert!(full.unwrap().is_full());
    }

    #[test]
    fn flush_drains_partial_bundles() {
        let mut batcher: CollisionBatcher<u32> = CollisionBatcher::new();
        batcher.push(0, 1);
        batcher.push(1, 2);

        let drained = batcher.flush();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(|(_, b)| !b.is_empty()));
    }

    #[test]
    fn flush_on_empty_batcher_yields_nothing() {
        let mut batcher: CollisionBatcher<u32> = CollisionBatcher::new();
        assert!(batcher.flush().is_empty());
    }
}
