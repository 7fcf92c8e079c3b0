//! The constraint solver: per-type prestep/warm-start/solve kernels,
//! dispatched by type id rather than virtual call (§9), run across
//! graph-colored batches for `velocity_iteration_count` passes (§4.7).

pub mod batch;
mod delta_vel;
pub mod contact_constraint;
pub mod removal;
pub mod softness;
pub mod volume_constraint;

pub use batch::{Batch, BatchSet};
pub use delta_vel::DeltaVel;

use crate::dynamics::integration_parameters::IntegrationParameters;
use crate::dynamics::rigid_body::RigidBody;
use crate::math::Real;
use contact_constraint::ContactConstraint;
use volume_constraint::VolumeConstraint;

/// A stable reference to one constraint instance, used as the pair cache's
/// persisted payload so a re-encountered pair can find its prior warm-start
/// state without a linear search (§4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintHandle(pub u32);

/// The constraint kinds this crate's type processor dispatches over. A real
/// engine would also register joint types here; this crate implements the
/// two kinds exercised end to end by the worked examples (§4.6, §8).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintTypeId {
    Contact,
    Volume,
}

/// Indices of the two (or, for [`ConstraintTypeId::Volume`], four) bodies a
/// constraint couples, used by the batch builder to detect conflicts.
#[derive(Clone, Copy, Debug)]
pub enum ConstraintBodies {
    Two([usize; 2]),
    Four([usize; 4]),
}

impl ConstraintBodies {
    pub fn as_slice(&self) -> &[usize] {
        match self {
            ConstraintBodies::Two(b) => b,
            ConstraintBodies::Four(b) => b,
        }
    }
}

enum ConstraintInstance {
    Contact(ContactConstraint),
    Volume(VolumeConstraint),
}

/// One constraint plus the body indices it touches, the unit the batch
/// builder and scheduler both operate on.
pub struct ConstraintEntry {
    pub handle: ConstraintHandle,
    pub bodies: ConstraintBodies,
    instance: ConstraintInstance,
}

impl ConstraintEntry {
    pub fn contact(handle: ConstraintHandle, body1: usize, body2: usize, constraint: ContactConstraint) -> Self {
        Self {
            handle,
            bodies: ConstraintBodies::Two([body1, body2]),
            instance: ConstraintInstance::Contact(constraint),
        }
    }

    pub fn volume(handle: ConstraintHandle, bodies: [usize; 4], constraint: VolumeConstraint) -> Self {
        Self {
            handle,
            bodies: ConstraintBodies::Four(bodies),
            instance: ConstraintInstance::Volume(constraint),
        }
    }

    /// The type id this entry dispatches under (§9: "dispatch by type id
    /// rather than virtual call"), exposed for callers that key per-type
    /// statistics or impulse-slot addressing off it rather than matching on
    /// the (private) instance enum directly.
    pub fn type_id(&self) -> ConstraintTypeId {
        match self.instance {
            ConstraintInstance::Contact(_) => ConstraintTypeId::Contact,
            ConstraintInstance::Volume(_) => ConstraintTypeId::Volume,
        }
    }

    /// Borrows the contact constraint this entry wraps, or `None` if it is
    /// a volume constraint. Lets a caller (e.g. the pipeline) read back
    /// solved impulses for pair-cache persistence without matching on the
    /// private instance enum.
    pub fn as_contact(&self) -> Option<&ContactConstraint> {
        match &self.instance {
            ConstraintInstance::Contact(c) => Some(c),
            ConstraintInstance::Volume(_) => None,
        }
    }
}

/// Runs every velocity iteration of one step over a fully built set of
/// batches, dispatching each constraint to its type's warm-start/solve
/// kernel. `deltas` is indexed by body slot in the active set.
pub fn run_velocity_iterations(
    params: &IntegrationParameters,
    batch_set: &BatchSet,
    entries: &mut [ConstraintEntry],
    bodies: &[RigidBody],
    deltas: &mut [DeltaVel<Real>],
) {
    for entry in entries.iter_mut() {
        if let ConstraintInstance::Contact(c) = &mut entry.instance {
            let [b1, b2] = match entry.bodies {
                ConstraintBodies::Two(b) => b,
                _ => unreachable!("contact constraints are always two-body"),
            };
            let (d1, d2) = split_two(deltas, b1, b2);
            c.warm_start(d1, d2);
        }
    }

    for _ in 0..params.velocity_iteration_count {
        for batch in batch_set.batches.iter().chain(batch_set.fallback.iter()) {
            for &index in &batch.constraint_indices {
                dispatch_solve(&mut entries[index], bodies, deltas);
            }
        }
    }

    apply_restitution(params, entries, deltas);
}

/// The dedicated post-iteration restitution pass supplementing the main
/// zero-target velocity iterations (§10.5): run once, after every
/// constraint set/batch has converged its normal impulses.
fn apply_restitution(params: &IntegrationParameters, entries: &mut [ConstraintEntry], deltas: &mut [DeltaVel<Real>]) {
    for entry in entries.iter_mut() {
        if let ConstraintInstance::Contact(c) = &mut entry.instance {
            let [b1, b2] = match entry.bodies {
                ConstraintBodies::Two(b) => b,
                _ => unreachable!("contact constraints are always two-body"),
            };
            let (d1, d2) = split_two(deltas, b1, b2);
            c.apply_restitution(d1, d2, params.restitution_velocity_threshold);
        }
    }
}

fn dispatch_solve(entry: &mut ConstraintEntry, bodies: &[RigidBody], deltas: &mut [DeltaVel<Real>]) {
    match (&mut entry.instance, &entry.bodies) {
        (ConstraintInstance::Contact(c), ConstraintBodies::Two([b1, b2])) => {
            let (d1, d2) = split_two(deltas, *b1, *b2);
            c.solve(d1, d2);
        }
        (ConstraintInstance::Volume(v), ConstraintBodies::Four(idx)) => {
            let positions = idx.map(|i| bodies[i].position.translation.vector);
            let mut local = idx.map(|i| deltas[i]);
            v.solve(positions, &mut local);
            for (slot, &i) in idx.iter().enumerate() {
                deltas[i] = local[slot];
            }
        }
        _ => unreachable!("constraint body-count/type mismatch"),
    }
}

/// Mutably borrows two disjoint elements of a slice by index. Panics if
/// `a == b`, which the batch builder's graph coloring guarantees cannot
/// happen within the same batch (§4.7 invariant: a body never repeats).
fn split_two(deltas: &mut [DeltaVel<Real>], a: usize, b: usize) -> (&mut DeltaVel<Real>, &mut DeltaVel<Real>) {
    assert_ne!(a, b, "a constraint referenced the same body twice");
    if a < b {
        let (left, right) = deltas.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = deltas.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
