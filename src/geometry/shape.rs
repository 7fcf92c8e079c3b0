//! Convex primitive and compound shapes, and the support-mapping adapter
//! (§4.2) that turns a directional query into a Minkowski-difference sample.

use crate::error::{NarrowPhaseError, NarrowPhaseResult};
use crate::geometry::collider::PairTypeId;
use crate::math::{Isometry, Point, Real, Vector};

/// A typed index into the engine's shape storage (out of scope: storage
/// itself lives in the body/static set collaborator).
pub type ShapeIndex = u32;

/// A single convex primitive.
///
/// Only the handful of primitives needed to exercise the depth refiner and
/// the worked contact scenarios (§8) are implemented; additional primitives
/// plug into the same `SupportMap` trait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConvexShape {
    Ball { radius: Real },
    Cuboid { half_extents: Vector },
    Capsule { half_height: Real, radius: Real },
}

impl ConvexShape {
    #[inline]
    fn kind_id(&self) -> u8 {
        match self {
            ConvexShape::Ball { .. } => 0,
            ConvexShape::Cuboid { .. } => 1,
            ConvexShape::Capsule { .. } => 2,
        }
    }
}

/// The collision batcher's/type-processor's key for a pair of convex shapes
/// (§4.5, §9): packs each shape's kind into one byte in the pair's already-
/// canonicalized order, so e.g. ball-cuboid and cuboid-ball never split
/// across two bundles.
#[inline]
pub fn pair_type_id(a: ConvexShape, b: ConvexShape) -> PairTypeId {
    (a.kind_id() as PairTypeId) << 8 | b.kind_id() as PairTypeId
}

/// A local-space child of a compound shape.
#[derive(Clone, Debug)]
pub struct CompoundChild {
    pub local_pose: Isometry,
    pub shape: ConvexShape,
}

/// A convex primitive or a compound of convex primitives.
///
/// Invariant (enforced at construction): compound children reference only
/// convexes — there is no nested-compound variant, so the invariant is
/// structural rather than checked at each use.
#[derive(Clone, Debug)]
pub enum Shape {
    Convex(ConvexShape),
    Compound(Vec<CompoundChild>),
}

impl Shape {
    /// Builds a compound shape, rejecting an empty child list per the
    /// precondition in §7.
    pub fn compound(children: Vec<CompoundChild>) -> NarrowPhaseResult<Self> {
        if children.is_empty() {
            return Err(NarrowPhaseError::EmptyCompound);
        }
        Ok(Shape::Compound(children))
    }

    /// `true` for any variant that can be queried directly via [`SupportMap`]
    /// (i.e. not a compound, which must be expanded into per-child pairs by
    /// the collision batcher before reaching the depth refiner).
    pub fn as_convex(&self) -> Option<ConvexShape> {
        match self {
            Shape::Convex(c) => Some(*c),
            Shape::Compound(_) => None,
        }
    }
}

/// Directional support query: the farthest point of a shape along `dir`,
/// expressed in the shape's own local space.
///
/// `dir` need not be normalized; support mapping is invariant to positive
/// scaling of the direction.
pub trait SupportMap {
    fn local_support_point(&self, dir: &Vector) -> Point;
}

impl SupportMap for ConvexShape {
    #[inline]
    fn local_support_point(&self, dir: &Vector) -> Point {
        match *self {
            ConvexShape::Ball { radius } => {
                let n = dir.try_normalize(1.0e-12).unwrap_or(Vector::x());
                Point::from(n * radius)
            }
            ConvexShape::Cuboid { half_extents } => Point::new(
                half_extents.x.copysign(dir.x),
                half_extents.y.copysign(dir.y),
                half_extents.z.copysign(dir.z),
            ),
            ConvexShape::Capsule {
                half_height,
                radius,
            } => {
                let n = dir.try_normalize(1.0e-12).unwrap_or(Vector::x());
                let sign = dir.y.signum();
                Point::new(n.x * radius, sign * half_height + n.y * radius, n.z * radius)
            }
        }
    }
}

/// Continuity mode of a collidable, controlling which CCD strategy (if any)
/// applies to contacts it participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ContinuityMode {
    pub inner_sphere: bool,
    pub substepping: bool,
}

impl ContinuityMode {
    pub const DISCRETE: Self = Self {
        inner_sphere: false,
        substepping: false,
    };

    /// Combined continuity of a pair: the OR of each collidable's features.
    #[inline]
    pub fn combine(a: Self, b: Self) -> Self {
        Self {
            inner_sphere: a.inner_sphere || b.inner_sphere,
            substepping: a.substepping || b.substepping,
        }
    }

    /// Whether either continuous-collision strategy is active.
    #[inline]
    pub fn is_continuous(&self) -> bool {
        self.inner_sphere || self.substepping
    }
}

/// A collidable: a shape reference plus the CCD/margin attributes the
/// narrow phase needs but does not own.
#[derive(Clone, Copy, Debug)]
pub struct Collidable {
    pub shape: ShapeIndex,
    pub continuity_mode: ContinuityMode,
    pub speculative_margin: Real,
}

impl Collidable {
    /// Combined margin/continuity for a pair, per §6 configuration rules.
    #[inline]
    pub fn combine(a: &Self, b: &Self) -> (Real, ContinuityMode) {
        (
            a.speculative_margin.max(b.speculative_margin),
            ContinuityMode::combine(a.continuity_mode, b.continuity_mode),
        )
    }
}
