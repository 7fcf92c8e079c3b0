//! Orchestrates one simulation step: broad phase -> batcher -> manifold
//! generation -> pair-cache reconciliation -> solver prestep -> warm start
//! -> velocity iterations -> integration -> removal flush (§2), timed
//! per-phase via [`Counters`].
//!
//! Grounded on the teacher's `PhysicsPipeline::step` structure: a single
//! entry point that owns nothing durable itself (bodies, the pair cache,
//! and the broad phase all outlive and are passed into a step) and records
//! per-phase timings unconditionally, at near-zero cost when disabled.

pub mod broad_phase;

pub use broad_phase::{BroadPhase, CandidatePair};

use crate::counters::Counters;
use crate::dynamics::solver::batch::build_batches;
use crate::dynamics::solver::contact_constraint::ContactConstraint;
use crate::dynamics::solver::softness::{Softness, SpringSettings};
use crate::dynamics::solver::{run_velocity_iterations, ConstraintEntry, ConstraintHandle, DeltaVel};
use crate::dynamics::{IntegrationParameters, RigidBody};
use crate::geometry::batcher::CollisionBatcher;
use crate::geometry::pair_cache::{PairCache, PairCacheDelta, PairScratch};
use crate::geometry::{handle_overlap, minkowski_support, pair_type_id, ConvexShape, DepthRefiner, PairId, RelativePose};
use crate::math::{Real, Vector};

/// A narrow-phase collidable as seen by the pipeline: just enough to run a
/// support-map query and prestep a contact constraint. Shape/pose storage
/// itself is the caller's responsibility (§6, §7).
pub struct PipelineCollidable<'a> {
    pub body_index: usize,
    pub shape: &'a ConvexShape,
}

/// The subset of a pair's state this pipeline persists across frames inside
/// the pair cache's opaque [`PairScratch`] (§4.4): the depth refiner's best
/// normal/depth (so next frame's search starts warm instead of from the
/// body-separation heuristic) and the single contact point's accumulated
/// impulses (so next frame's `warm_start` is not a no-op).
#[derive(Clone, Copy, Debug)]
struct PersistedPairState {
    seed_normal: Vector,
    seed_depth: Real,
    normal_impulse: Real,
    tangent_impulse: [Real; 2],
}

impl PersistedPairState {
    const WORDS: usize = 7;

    fn encode(&self) -> PairScratch {
        let mut bytes = Vec::with_capacity(Self::WORDS * 4);
        for v in [
            self.seed_normal.x,
            self.seed_normal.y,
            self.seed_normal.z,
            self.seed_depth,
            self.normal_impulse,
            self.tangent_impulse[0],
            self.tangent_impulse[1],
        ] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        PairScratch { bytes }
    }

    fn decode(scratch: &PairScratch) -> Option<Self> {
        if scratch.bytes.len() != Self::WORDS * 4 {
            return None;
        }
        let word = |i: usize| Real::from_le_bytes(scratch.bytes[i * 4..i * 4 + 4].try_into().unwrap());
        Some(Self {
            seed_normal: Vector::new(word(0), word(1), word(2)),
            seed_depth: word(3),
            normal_impulse: word(4),
            tangent_impulse: [word(5), word(6)],
        })
    }
}

/// A candidate pair that has cleared canonicalization and collidable lookup,
/// queued in the collision batcher until its bundle is ready to drain.
struct PendingPair {
    pair: PairId,
    body1: usize,
    body2: usize,
    rel: RelativePose,
    previous_handle: Option<ConstraintHandle>,
    previous_state: Option<PersistedPairState>,
}

/// Bookkeeping kept between building a constraint entry and writing its
/// post-solve state back to the pair cache.
struct PairBookkeeping {
    entry_index: usize,
    pair: PairId,
    handle: ConstraintHandle,
    is_new: bool,
    seed_normal: Vector,
    seed_depth: Real,
}

pub struct PhysicsPipeline {
    pub counters: Counters,
    next_constraint_id: u32,
}

impl PhysicsPipeline {
    pub fn new() -> Self {
        Self {
            counters: Counters::new(true),
            next_constraint_id: 0,
        }
    }

    /// Runs one full step:
    ///
    /// 1. collects candidate pairs from the broad phase and accumulates them
    ///    into the collision batcher, keyed by shape-pair type (§4.5),
    /// 2. for each drained bundle, runs the depth refiner per pair and
    ///    reconciles the result against the pair cache — an already-known
    ///    pair keeps its handle and warm-starts from its persisted impulses,
    ///    a new one mints a fresh handle (§4.4),
    /// 3. batches the resulting constraints and runs velocity iterations,
    /// 4. writes each surviving pair's solved state back to the pair cache
    ///    and flushes it, returning removed constraint handles.
    pub fn step(
        &mut self,
        params: &IntegrationParameters,
        broad_phase: &mut dyn BroadPhase,
        bodies: &mut [RigidBody],
        collidables: &[PipelineCollidable],
        pair_cache: &mut PairCache,
    ) -> Vec<ConstraintHandle> {
        self.counters.reset();

        self.counters.collision_detection_time.resume();
        let mut candidates = Vec::new();
        broad_phase.find_candidate_pairs(&mut candidates);

        let mut entries: Vec<ConstraintEntry> = Vec::new();
        let mut bookkeeping: Vec<PairBookkeeping> = Vec::new();

        let mut batcher: CollisionBatcher<PendingPair> = CollisionBatcher::new();

        let mut drain_bundle = |items: Vec<PendingPair>,
                                 entries: &mut Vec<ConstraintEntry>,
                                 bookkeeping: &mut Vec<PairBookkeeping>,
                                 next_id: &mut u32| {
            for pending in items {
                Self::build_contact_entry(params, pending, bodies, collidables, entries, bookkeeping, next_id);
            }
        };

        for candidate in candidates {
            let Ok((_, pair)) = handle_overlap(0, candidate.a, candidate.b) else {
                continue;
            };

            let Some(collidable_a) = collidables.iter().find(|c| c.body_index as u32 == pair.first.handle) else {
                continue;
            };
            let Some(collidable_b) = collidables.iter().find(|c| c.body_index as u32 == pair.second.handle) else {
                continue;
            };

            let body1 = &bodies[collidable_a.body_index];
            let body2 = &bodies[collidable_b.body_index];
            let rel = RelativePose::new(&body1.position, &body2.position);

            let (previous_handle, previous_state) = match pair_cache.lookup(&pair) {
                Some((handle, scratch)) => (handle, PersistedPairState::decode(scratch)),
                None => (None, None),
            };

            let pending = PendingPair {
                pair,
                body1: collidable_a.body_index,
                body2: collidable_b.body_index,
                rel,
                previous_handle,
                previous_state,
            };

            let type_id = pair_type_id(*collidable_a.shape, *collidable_b.shape);
            if let Some(full) = batcher.push(type_id, pending) {
                drain_bundle(
                    full.as_slice().to_vec(),
                    &mut entries,
                    &mut bookkeeping,
                    &mut self.next_constraint_id,
                );
            }
        }

        // Phase 2: flush every bundle the broad phase left partially filled.
        for (_type_id, bundle) in batcher.flush() {
            drain_bundle(
                bundle.as_slice().to_vec(),
                &mut entries,
                &mut bookkeeping,
                &mut self.next_constraint_id,
            );
        }
        self.counters.collision_detection_time.pause();

        self.counters.solver_time.resume();
        let batch_set = build_batches(&entries, bodies.len(), params.fallback_batch_threshold);
        let mut deltas: Vec<DeltaVel<Real>> = (0..bodies.len()).map(|_| DeltaVel::zero()).collect();
        run_velocity_iterations(params, &batch_set, &mut entries, bodies, &mut deltas);

        for (body, delta_vel) in bodies.iter_mut().zip(deltas.iter()) {
            body.linvel += delta_vel.linear;
            body.angvel += delta_vel.angular;
        }
        self.counters.solver_time.pause();

        self.counters.removal_flush_time.resume();
        let mut delta = PairCacheDelta::new();
        for book in bookkeeping {
            let contact = entries[book.entry_index]
                .as_contact()
                .expect("pipeline only ever builds contact entries");
            let (normal_impulse, tangent_impulse) = contact
                .points
                .first()
                .map(|p| p.warm_start_state())
                .unwrap_or((0.0, [0.0, 0.0]));

            let scratch = PersistedPairState {
                seed_normal: book.seed_normal,
                seed_depth: book.seed_depth,
                normal_impulse,
                tangent_impulse,
            }
            .encode();

            if book.is_new {
                PairCache::mark_pending_add(&mut delta, book.pair, Some(book.handle), scratch);
            } else {
                PairCache::update(&mut delta, book.pair, Some(book.handle), scratch);
            }
        }
        let removed = pair_cache.flush([delta]);
        self.counters.removal_flush_time.pause();

        removed
    }

    /// Runs the depth refiner for one pending pair and, if it produces a
    /// contact within the prediction distance, preps a contact constraint
    /// (warm-started from `pending.previous_state` when present) and
    /// records it plus the bookkeeping needed to persist its solved state.
    fn build_contact_entry(
        params: &IntegrationParameters,
        pending: PendingPair,
        bodies: &[RigidBody],
        collidables: &[PipelineCollidable],
        entries: &mut Vec<ConstraintEntry>,
        bookkeeping: &mut Vec<PairBookkeeping>,
        next_constraint_id: &mut u32,
    ) {
        let Some(collidable_a) = collidables.iter().find(|c| c.body_index == pending.body1) else {
            return;
        };
        let Some(collidable_b) = collidables.iter().find(|c| c.body_index == pending.body2) else {
            return;
        };

        let body1 = &bodies[pending.body1];
        let body2 = &bodies[pending.body2];

        let (seed_normal, seed_depth) = match pending.previous_state {
            Some(state) => (state.seed_normal, state.seed_depth),
            None => {
                let heuristic = (body2.position.translation.vector - body1.position.translation.vector)
                    .try_normalize(1.0e-6)
                    .unwrap_or_else(Vector::x);
                (heuristic, 0.0)
            }
        };

        let refiner = DepthRefiner::new(seed_normal, seed_depth, pending.rel.b_in_a.translation.vector);
        let config = params.depth_refiner_config();
        let result = refiner.refine(
            |dir| minkowski_support(collidable_a.shape, collidable_b.shape, &pending.rel, dir),
            &config,
        );

        if result.depth < -params.prediction_distance {
            // Not close enough to need a constraint this frame. Leaving the
            // pair out of `bookkeeping` means its cache entry is neither
            // updated nor re-added, so it ages out as stale at this step's
            // flush (§8 scenario 5) if it was never revisited otherwise.
            return;
        }

        let contact = (Vector::zeros(), Vector::zeros(), -result.depth, 0.5, 0.0);
        let softness = Softness::new(SpringSettings::rigid(params.dt), params.dt);
        let mut constraint = ContactConstraint::prestep(body1, body2, result.normal, &[contact], softness);

        let previous_impulse = pending
            .previous_state
            .map(|s| (s.normal_impulse, s.tangent_impulse))
            .unwrap_or((0.0, [0.0, 0.0]));
        constraint.seed_warm_start(&[previous_impulse]);

        let (handle, is_new) = match pending.previous_handle {
            Some(handle) => (handle, false),
            None => {
                let handle = ConstraintHandle(*next_constraint_id);
                *next_constraint_id += 1;
                (handle, true)
            }
        };

        let entry_index = entries.len();
        entries.push(ConstraintEntry::contact(handle, pending.body1, pending.body2, constraint));
        bookkeeping.push(PairBookkeeping {
            entry_index,
            pair: pending.pair,
            handle,
            is_new,
            seed_normal: result.normal,
            seed_depth: result.depth,
        });
    }
}

impl Default for PhysicsPipeline {
    fn default() -> Self {
        Self::new()
    }
}
