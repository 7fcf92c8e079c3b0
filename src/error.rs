//! Contract and resource-exhaustion errors.
//!
//! Per the error-handling design, only two of the four error categories ever
//! construct a value of this type: precondition violations and allocation
//! failure. Degenerate geometry and non-convergence are handled in-algorithm
//! and never surfaced (see `geometry::depth_refiner`).

use thiserror::Error;

/// Errors returned at the narrow-phase/solver contract boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowPhaseError {
    /// `handle_overlap` was called with two collidables that are both static.
    #[error("a pair cannot be formed between two static collidables")]
    StaticStaticPair,
    /// `handle_overlap` was called with a collidable paired against itself.
    #[error("a collidable cannot be paired against itself")]
    SelfPair,
    /// A compound shape was constructed, or encountered, with zero children.
    #[error("a compound shape must have at least one child")]
    EmptyCompound,
    /// A compound shape nested another compound past the enforced tree depth.
    #[error("compound children must reference convex shapes, not nested compounds")]
    NestedCompound,
    /// The per-worker bump allocator could not satisfy a `take` request.
    ///
    /// The current step must be aborted atomically: no partial mutation from
    /// this step is visible to callers once this error is returned.
    #[error("narrow phase allocator exhausted: {requested} bytes requested")]
    OutOfMemory {
        /// Number of bytes that were requested and could not be satisfied.
        requested: usize,
    },
}

/// Convenience alias for fallible narrow-phase/solver contract APIs.
pub type NarrowPhaseResult<T> = Result<T, NarrowPhaseError>;
