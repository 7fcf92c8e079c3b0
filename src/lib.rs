//! Narrow-phase collision depth refinement and constraint-solver core for a
//! real-time rigid-body physics engine.
//!
//! The crate is organized the way the teacher crate is: `geometry` owns
//! shape representation, pair identity, and the depth-refinement algorithm;
//! `dynamics` owns bodies, constraints, and the solver scheduler; `pipeline`
//! wires the two together and is the only module that calls into an
//! external broad phase.

pub extern crate nalgebra as na;

pub mod counters;
pub mod dynamics;
pub mod error;
pub mod geometry;
pub mod math;
pub mod pipeline;
pub mod utils;

pub use error::{NarrowPhaseError, NarrowPhaseResult};
