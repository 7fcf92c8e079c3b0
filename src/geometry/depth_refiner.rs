//! The iterative simplex-based minimum-translation-vector search (§4.3).
//!
//! This is the narrow phase's core algorithm: given two convex shapes, an
//! initial normal guess, and an initial depth estimate, refine both the
//! normal and the signed penetration depth (positive = penetrating).
//!
//! One [`DepthRefiner`] instance tracks the state of a single lane (simplex +
//! best-so-far normal/depth). [`WideDepthRefiner`] runs `SIMD_WIDTH`
//! independent instances side by side — per §4.2 lanes never interact, so a
//! bundle is simply `SIMD_WIDTH` of these pushed through [`refine`]
//! independently. A future true-SIMD implementation would replace the
//! per-lane loop with `SimdReal` arithmetic without changing this contract;
//! see `DESIGN.md`.

use crate::math::{squared, Point, Real, Vector};

/// One slot of the up-to-3-vertex simplex.
#[derive(Clone, Copy, Debug)]
struct SimplexVertex {
    point: Point,
    exists: bool,
}

impl SimplexVertex {
    const EMPTY: Self = Self {
        point: Point::new(0.0, 0.0, 0.0),
        exists: false,
    };
}

/// Per-lane state carried across [`refine`] iterations.
#[derive(Clone, Copy, Debug)]
pub struct DepthRefiner {
    simplex: [SimplexVertex; 3],
    best_depth: Real,
    best_normal: Vector,
    /// The fixed offset from A's origin to B's origin, in A's frame —
    /// constant for the whole refinement, unlike any particular
    /// Minkowski-difference sample. Used only to orient the face normal
    /// outward in [`DepthRefiner::closest_feature`] (§4.3 step 6).
    reference_offset: Vector,
}

/// Tunable parameters controlling when [`refine`] stops.
#[derive(Clone, Copy, Debug)]
pub struct DepthRefinerConfig {
    pub max_iterations: u32,
    pub convergence_threshold: Real,
    pub minimum_depth_threshold: Real,
}

impl Default for DepthRefinerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            convergence_threshold: 1.0e-4,
            minimum_depth_threshold: -0.1,
        }
    }
}

/// The refined result: normal points from B toward A's penetration
/// direction (i.e. the direction along which A should move to separate),
/// and `depth > 0` means the shapes are penetrating by that amount.
#[derive(Clone, Copy, Debug)]
pub struct DepthResult {
    pub normal: Vector,
    pub depth: Real,
    /// `true` if the loop terminated via early convergence or the minimum
    /// depth floor rather than exhausting `max_iterations`.
    pub converged: bool,
    pub iterations: u32,
}

impl DepthRefiner {
    /// Seeds the refiner with an initial normal guess and overlap estimate,
    /// consuming one sample from the supplied support function.
    ///
    /// `reference_offset` is the fixed offset from A's origin to B's origin
    /// in A's frame (e.g. `rel.b_in_a.translation.vector`), used to orient
    /// the refined normal outward (§4.3 step 6); it must not be confused
    /// with any Minkowski-difference sample, which varies per query.
    pub fn new(initial_normal: Vector, initial_depth: Real, reference_offset: Vector) -> Self {
        let normal = initial_normal.try_normalize(1.0e-12).unwrap_or(Vector::x());
        Self {
            simplex: [SimplexVertex::EMPTY; 3],
            best_depth: initial_depth,
            best_normal: normal,
            reference_offset,
        }
    }

    /// Runs the iterative refinement to convergence, cap, or the minimum
    /// depth floor. `support` maps a direction (in the Minkowski-difference
    /// frame) to the farthest sample of `A - B` along it.
    pub fn refine(
        mut self,
        support: impl Fn(&Vector) -> Point,
        config: &DepthRefinerConfig,
    ) -> DepthResult {
        // Prime the simplex with one support sample along the initial guess,
        // matching step 10 of the first iteration's "fold in the new sample"
        // contract.
        let mut direction = self.best_normal;
        let mut pending_sample: Option<Point> = Some(support(&direction));

        let mut iterations = 0u32;
        let mut converged = false;

        while iterations < config.max_iterations {
            iterations += 1;

            // Step 1: search target.
            let target: Point = if self.best_depth <= 0.0 {
                Point::origin()
            } else {
                Point::from(self.best_normal * self.best_depth)
            };

            // Step 2: fold the pending sample into the simplex.
            if let Some(d) = pending_sample.take() {
                self.fold_sample(d, &target);
            }

            // Steps 3-6: classify the simplex and find the closest feature.
            let (closest, feature_dir, is_face_interior) = self.closest_feature(&target);

            // Step 7: early termination check.
            let dist2 = na::distance_squared(&target, &closest);
            let eps = if self.best_depth >= 0.0 {
                config.convergence_threshold
            } else {
                config.convergence_threshold - self.best_depth
            };
            if dist2 <= squared(eps) {
                converged = true;
                break;
            }

            // Step 8: next search direction, tilted away from the surface
            // when strictly inside the face in the penetrating regime.
            let raw_dir = target - closest;
            direction = if is_face_interior && self.best_depth > 0.0 {
                let tilted = target + raw_dir * 4.0;
                (tilted - closest)
                    .try_normalize(1.0e-12)
                    .unwrap_or(feature_dir)
            } else {
                raw_dir.try_normalize(1.0e-12).unwrap_or(feature_dir)
            };

            // Step 10: sample the new support point and update best depth.
            let d = support(&direction);
            let depth = d.coords.dot(&direction);
            if depth < self.best_depth {
                self.best_depth = depth;
                self.best_normal = direction;
            }
            pending_sample = Some(d);

            // Step 11: floor termination.
            if self.best_depth <= config.minimum_depth_threshold {
                converged = true;
                break;
            }
        }

        if !converged {
            log::debug!(
                "depth refiner exhausted {} iterations without converging (best_depth = {})",
                iterations,
                self.best_depth
            );
        }

        DepthResult {
            normal: self.best_normal,
            depth: self.best_depth,
            converged,
            iterations,
        }
    }

    /// Step 2: fills an empty slot, or chooses a sub-triangle of the full
    /// simplex that best frames the direction from `target` to `d`.
    fn fold_sample(&mut self, d: Point, target: &Point) {
        if let Some(empty) = self.simplex.iter_mut().find(|v| !v.exists) {
            *empty = SimplexVertex { point: d, exists: true };
            return;
        }

        let [a, b, c] = self.simplex.map(|v| v.point);

        // One shared ABC normal, established once from the pre-fold
        // triangle and reused for every candidate's plane test below —
        // mirroring the barycentric edge tests at lines 255-257, not a
        // fresh normal recomputed from each candidate's own two edges
        // (which would silently pick a different face whenever the
        // pre-fold normal disagrees with a candidate's own-edge normal,
        // e.g. near-degenerate/twisted simplices).
        let abc_normal = (b - a).cross(&(c - a));

        // Candidate sub-triangles, each replacing the vertex not shared with
        // the new sample: ABD replaces C, BCD replaces A, CAD replaces B.
        // Each test asks whether `d` lies on the outward side of the
        // corresponding edge of the *original* triangle, oriented by the
        // shared `abc_normal`.
        let candidates = [
            (a, b - a, 2usize), // edge AB, drop C
            (b, c - b, 0usize), // edge BC, drop A
            (c, a - c, 1usize), // edge CA, drop B
        ];

        for (anchor, edge, drop_index) in candidates {
            if (d - anchor).cross(&edge).dot(&abc_normal) > 0.0 {
                self.simplex[drop_index] = SimplexVertex { point: d, exists: true };
                return;
            }
        }

        // No sub-triangle qualifies: default to ABD (drop C). Per the
        // contract this only happens when best depth strictly improved this
        // iteration, which guarantees forward progress even though the
        // portal looks degenerate from this test.
        self.simplex[2] = SimplexVertex { point: d, exists: true };
    }

    /// Steps 3-6: returns `(closest point to target, direction to use if the
    /// feature degenerates to empty search, true if target lands strictly
    /// inside the triangle's edge planes)`.
    ///
    /// Also updates `exists` flags (step 9) so only the vertices supporting
    /// the selected feature remain marked.
    fn closest_feature(&mut self, target: &Point) -> (Point, Vector, bool) {
        let existing: arrayvec::ArrayVec<usize, 3> = (0..3)
            .filter(|&i| self.simplex[i].exists)
            .collect();

        if existing.len() <= 1 {
            let i = existing.first().copied().unwrap_or(0);
            let p = self.simplex[i].point;
            for (j, v) in self.simplex.iter_mut().enumerate() {
                v.exists = j == i;
            }
            let dir = (*target - p).try_normalize(1.0e-12).unwrap_or(Vector::x());
            return (p, dir, false);
        }

        if existing.len() == 2 {
            let (i0, i1) = (existing[0], existing[1]);
            let (closest, t) = closest_on_segment(self.simplex[i0].point, self.simplex[i1].point, *target);
            for (j, v) in self.simplex.iter_mut().enumerate() {
                v.exists = j == i0 || j == i1;
            }
            let _ = t;
            let dir = (*target - closest).try_normalize(1.0e-12).unwrap_or(Vector::x());
            return (closest, dir, false);
        }

        // Full triangle.
        let a = self.simplex[0].point;
        let b = self.simplex[1].point;
        let c = self.simplex[2].point;

        let ab = b - a;
        let bc = c - b;
        let ca = a - c;
        let normal = ab.cross(&(-ca));
        let len2 = normal.norm_squared();

        let max_edge_len2 = ab.norm_squared().max(bc.norm_squared()).max(ca.norm_squared());
        let degenerate = len2 <= 1.0e-10 * max_edge_len2.max(1.0e-30);

        // Plane tests of `target` against each edge, oriented by `normal`;
        // sign alone (no division by len2) tells us which side it's on.
        let offset_ab = (*target - a).cross(&ab).dot(&normal);
        let offset_bc = (*target - b).cross(&bc).dot(&normal);
        let offset_ca = (*target - c).cross(&ca).dot(&normal);

        let vertex_case = degenerate && max_edge_len2 < 1.0e-14;

        if vertex_case {
            let p = a;
            for (j, v) in self.simplex.iter_mut().enumerate() {
                v.exists = j == 0;
            }
            let dir = (*target - p).try_normalize(1.0e-12).unwrap_or(Vector::x());
            return (p, dir, false);
        }

        let edge_violated = offset_ab < 0.0 || offset_bc < 0.0 || offset_ca < 0.0;

        if degenerate || edge_violated {
            // Pick the first violated edge (AB, then BC, then CA); for a
            // degenerate-but-non-vertex simplex with no violation, fall back
            // to the longest edge.
            let (p0, p1, i0, i1) = if offset_ab < 0.0 {
                (a, b, 0usize, 1usize)
            } else if offset_bc < 0.0 {
                (b, c, 1usize, 2usize)
            } else if offset_ca < 0.0 {
                (c, a, 2usize, 0usize)
            } else {
                // Degenerate, no edge violated: use the longest edge.
                if ab.norm_squared() >= bc.norm_squared() && ab.norm_squared() >= ca.norm_squared() {
                    (a, b, 0, 1)
                } else if bc.norm_squared() >= ca.norm_squared() {
                    (b, c, 1, 2)
                } else {
                    (c, a, 2, 0)
                }
            };

            let (closest, _t) = closest_on_segment(p0, p1, *target);
            for (j, v) in self.simplex.iter_mut().enumerate() {
                v.exists = j == i0 || j == i1;
            }
            let dir = (*target - closest).try_normalize(1.0e-12).unwrap_or(Vector::x());
            return (closest, dir, false);
        }

        // Target is inside all three edge planes: the face itself is the
        // closest feature. All three vertices stay marked as supporting it.
        for v in self.simplex.iter_mut() {
            v.exists = true;
        }
        let outward = calibrate_normal(normal, self.reference_offset);
        (a, outward, true)
    }
}

/// Calibrates `normal` to point outward from the other body, flipping it if
/// it has negative dot product with `reference` — the fixed offset from A's
/// origin to B's origin in A's frame, constant for the whole refinement, as
/// opposed to any particular Minkowski-difference sample.
#[inline]
fn calibrate_normal(normal: Vector, reference: Vector) -> Vector {
    let n = normal.try_normalize(1.0e-12).unwrap_or(Vector::x());
    if n.dot(&reference) < 0.0 {
        -n
    } else {
        n
    }
}

/// Closest point on segment `[a, b]` to `target`, with the interpolation
/// parameter clamped to `[0, 1]`.
#[inline]
fn closest_on_segment(a: Point, b: Point, target: Point) -> (Point, Real) {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 1.0e-20 {
        return (a, 0.0);
    }
    let t = ((target - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// A bundle of `SIMD_WIDTH` independent depth-refinement problems.
///
/// Per §4.2, lanes never interact: this is a thin fan-out over
/// [`DepthRefiner::refine`], one call per lane.
pub struct WideDepthRefiner<const W: usize> {
    refiners: [Option<DepthRefiner>; W],
}

impl<const W: usize> WideDepthRefiner<W> {
    pub fn new() -> Self {
        Self {
            refiners: [None; W],
        }
    }

    /// Sets the initial guess for lane `i`. `reference_offset` is that
    /// lane's fixed A-to-B origin offset (see [`DepthRefiner::new`]).
    pub fn set_lane(&mut self, i: usize, initial_normal: Vector, initial_depth: Real, reference_offset: Vector) {
        self.refiners[i] = Some(DepthRefiner::new(initial_normal, initial_depth, reference_offset));
    }

    /// Runs every populated lane to completion, independently.
    pub fn refine_all(
        &self,
        support: impl Fn(usize, &Vector) -> Point,
        config: &DepthRefinerConfig,
    ) -> [Option<DepthResult>; W] {
        let mut out = [None; W];
        for (i, refiner) in self.refiners.iter().enumerate() {
            if let Some(r) = refiner {
                out[i] = Some(r.refine(|dir| support(i, dir), config));
            }
        }
        out
    }
}

impl<const W: usize> Default for WideDepthRefiner<W> {
    fn default() -> Self {
        Self::new()
    }
}
