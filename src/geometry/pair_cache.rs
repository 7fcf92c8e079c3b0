//! Maps stable pair identity to a constraint handle plus optional per-pair
//! scratch, with a fresh/stale diff-list flushed once per frame (§4.4).
//!
//! During the parallel narrow-phase phase the *previous* frame's mapping is
//! read-only; each worker records its updates into its own append-only
//! delta list (§9: "Mutable cross-frame mapping"). `flush` is the single
//! point where the map is mutated.

use std::collections::HashMap;

use crate::dynamics::solver::ConstraintHandle;
use crate::geometry::collider::PairId;

/// Opaque per-pair scratch data persisted across frames (e.g. a GJK/MPR
/// simplex or manifold warm-start identifiers). The narrow phase treats the
/// contents as caller-owned; the pair cache only moves it around.
#[derive(Clone, Debug, Default)]
pub struct PairScratch {
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
struct PairCacheEntry {
    constraint: Option<ConstraintHandle>,
    scratch: PairScratch,
    fresh: bool,
}

/// One worker's buffered updates for this frame, merged at [`PairCache::flush`].
#[derive(Default)]
pub struct PairCacheDelta {
    updates: Vec<(PairId, Option<ConstraintHandle>, PairScratch)>,
    adds: Vec<(PairId, Option<ConstraintHandle>, PairScratch)>,
}

impl PairCacheDelta {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The persistent pair → constraint/scratch mapping.
#[derive(Default)]
pub struct PairCache {
    entries: HashMap<PairId, PairCacheEntry>,
}

impl PairCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the previous frame's mapping for `pair`. Safe to call
    /// concurrently from any worker during the parallel narrow phase: this
    /// never observes the current frame's uncommitted updates.
    pub fn lookup(&self, pair: &PairId) -> Option<(Option<ConstraintHandle>, &PairScratch)> {
        self.entries
            .get(pair)
            .map(|e| (e.constraint, &e.scratch))
    }

    /// Records a fresh-this-frame update to an existing entry into the
    /// calling worker's delta list; visible to other workers only after
    /// [`flush`](Self::flush).
    pub fn update(
        delta: &mut PairCacheDelta,
        pair: PairId,
        constraint: Option<ConstraintHandle>,
        scratch: PairScratch,
    ) {
        delta.updates.push((pair, constraint, scratch));
    }

    /// Enqueues a brand-new pair for insertion at flush time.
    pub fn mark_pending_add(
        delta: &mut PairCacheDelta,
        pair: PairId,
        constraint: Option<ConstraintHandle>,
        scratch: PairScratch,
    ) {
        delta.adds.push((pair, constraint, scratch));
    }

    /// Single-threaded end-of-frame postpass: applies every worker's
    /// buffered updates/adds, then removes entries that were not visited
    /// this frame, returning their constraint handles to the caller so the
    /// corresponding constraints can be queued for removal (§4.8).
    pub fn flush(&mut self, deltas: impl IntoIterator<Item = PairCacheDelta>) -> Vec<ConstraintHandle> {
        for entry in self.entries.values_mut() {
            entry.fresh = false;
        }

        for delta in deltas {
            for (pair, constraint, scratch) in delta.updates {
                if let Some(entry) = self.entries.get_mut(&pair) {
                    entry.constraint = constraint;
                    entry.scratch = scratch;
                    entry.fresh = true;
                }
            }
            for (pair, constraint, scratch) in delta.adds {
                self.entries.insert(
                    pair,
                    PairCacheEntry {
                        constraint,
                        scratch,
                        fresh: true,
                    },
                );
            }
        }

        let mut removed_handles = Vec::new();
        self.entries.retain(|_, entry| {
            if entry.fresh {
                true
            } else {
                if let Some(handle) = entry.constraint {
                    removed_handles.push(handle);
                }
                false
            }
        });

        if !removed_handles.is_empty() {
            log::trace!("pair cache flush evicted {} stale entries", removed_handles.len());
        }

        removed_handles
    }

    /// Number of entries currently tracked, fresh or not (test/introspection only).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn is_fresh(&self, pair: &PairId) -> Option<bool> {
        self.entries.get(pair).map(|e| e.fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::collider::{ColliderRef, Mobility};

    fn pair(a: u32, b: u32) -> PairId {
        PairId::canonicalize(
            ColliderRef::new(a, Mobility::Dynamic),
            ColliderRef::new(b, Mobility::Dynamic),
        )
        .unwrap()
    }

    #[test]
    fn freshness_after_flush() {
        let mut cache = PairCache::new();
        let p = pair(1, 2);

        let mut delta = PairCacheDelta::new();
        PairCache::mark_pending_add(&mut delta, p, Some(ConstraintHandle(0)), PairScratch::default());
        let removed = cache.flush([delta]);

        assert!(removed.is_empty());
        assert_eq!(cache.is_fresh(&p), Some(true));
    }

    #[test]
    fn stale_entries_are_removed_and_handle_returned() {
        let mut cache = PairCache::new();
        let p = pair(1, 2);

        let mut delta = PairCacheDelta::new();
        PairCache::mark_pending_add(&mut delta, p, Some(ConstraintHandle(42)), PairScratch::default());
        cache.flush([delta]);

        // Frame N+1: nobody visits `p` again.
        let removed = cache.flush([PairCacheDelta::new()]);

        assert_eq!(removed, vec![ConstraintHandle(42)]);
        assert!(cache.lookup(&p).is_none());
    }
}
