//! Shape representation, pair identity, and narrow-phase contact queries.

pub mod batcher;
pub mod collider;
pub mod contact_manifold;
pub mod contact_pair;
pub mod depth_refiner;
pub mod pair_cache;
pub mod shape;
pub mod support_map;

pub use collider::{handle_overlap, ColliderRef, Mobility, PairId, PairTypeId};
pub use contact_manifold::{Contact, ContactManifold, FeatureId, MAX_MANIFOLD_POINTS};
pub use contact_pair::{ContactData, ContactPair, SolverFlags};
pub use depth_refiner::{DepthRefiner, DepthRefinerConfig, DepthResult, WideDepthRefiner};
pub use pair_cache::{PairCache, PairCacheDelta, PairScratch};
pub use shape::{pair_type_id, Collidable, CompoundChild, ContinuityMode, ConvexShape, Shape, ShapeIndex, SupportMap};
pub use support_map::{minkowski_support, RelativePose};
