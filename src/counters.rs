//! Timing counters for benchmarking, reduced from the teacher's own
//! `Counters` type down to the phases this crate actually runs.
//!
//! These are timing-only (no allocation counting, no histogram), matching
//! the teacher's `physics_pipeline.rs` usage of `resume()`/`pause()` pairs
//! around each stage of `step`.

use std::time::{Duration, Instant};

/// A single resumable/pausable stopwatch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    total: Duration,
    started_at: Option<Instant>,
}

impl Timer {
    /// Starts (or resumes) the timer.
    #[inline]
    pub fn resume(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Pauses the timer, accumulating the elapsed time into the total.
    #[inline]
    pub fn pause(&mut self) {
        if let Some(start) = self.started_at.take() {
            self.total += start.elapsed();
        }
    }

    /// The accumulated duration across all resume/pause pairs since the last reset.
    #[inline]
    pub fn time(&self) -> Duration {
        self.total
    }

    #[inline]
    fn reset(&mut self) {
        self.total = Duration::ZERO;
        self.started_at = None;
    }
}

/// Per-stage timers for one call to [`crate::pipeline::PhysicsPipeline::step`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Counters {
    pub enabled: bool,
    /// Broad-phase-to-batcher accumulation plus manifold generation.
    pub collision_detection_time: Timer,
    /// Prestep + warmstart + velocity iterations + restitution.
    pub solver_time: Timer,
    /// The end-of-step removal flush and pair-cache flush.
    pub removal_flush_time: Timer,
}

impl Counters {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Resets all timers to zero, called at the start of each step.
    pub fn reset(&mut self) {
        if !self.enabled {
            return;
        }
        self.collision_detection_time.reset();
        self.solver_time.reset();
        self.removal_flush_time.reset();
    }
}
