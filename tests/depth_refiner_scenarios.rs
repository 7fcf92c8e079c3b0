//! Concrete depth-refiner scenarios from the worked examples.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use narrowphase3d::geometry::{
    minkowski_support, ConvexShape, DepthRefiner, DepthRefinerConfig, RelativePose,
};
use narrowphase3d::math::{Isometry, Vector};

fn config() -> DepthRefinerConfig {
    DepthRefinerConfig::default()
}

#[test]
fn two_unit_spheres_overlap_by_point_one() {
    let a = ConvexShape::Ball { radius: 1.0 };
    let b = ConvexShape::Ball { radius: 1.0 };

    let pose_a = Isometry::identity();
    let pose_b = Isometry::translation(1.9, 0.0, 0.0);
    let rel = RelativePose::new(&pose_a, &pose_b);

    let refiner = DepthRefiner::new(Vector::x(), 0.0, rel.b_in_a.translation.vector);
    let result = refiner.refine(|dir| minkowski_support(&a, &b, &rel, dir), &config());

    assert_abs_diff_eq!(result.depth, 0.1, epsilon = 1.0e-3);
    assert_relative_eq!(result.normal, Vector::x(), epsilon = 1.0e-2);
}

#[test]
fn sphere_resting_on_box_plane() {
    let sphere = ConvexShape::Ball { radius: 1.0 };
    let plane = ConvexShape::Cuboid {
        half_extents: Vector::new(5.0, 0.05, 5.0),
    };

    let pose_sphere = Isometry::translation(0.0, 0.9, 0.0);
    let pose_plane = Isometry::translation(0.0, -0.05, 0.0);
    let rel = RelativePose::new(&pose_sphere, &pose_plane);

    let refiner = DepthRefiner::new(Vector::y(), 0.0, rel.b_in_a.translation.vector);
    let result = refiner.refine(
        |dir| minkowski_support(&sphere, &plane, &rel, dir),
        &config(),
    );

    assert_abs_diff_eq!(result.depth, 0.05, epsilon = 1.0e-3);
    assert_relative_eq!(result.normal, Vector::y(), epsilon = 1.0e-2);
}

#[test]
fn best_depth_is_monotone_non_increasing() {
    // Re-derive the refiner's trajectory by running short prefixes and
    // checking each successive best_depth never increases relative to the
    // previous run's final value.
    let a = ConvexShape::Ball { radius: 1.0 };
    let b = ConvexShape::Ball { radius: 1.0 };
    let pose_a = Isometry::identity();
    let pose_b = Isometry::translation(1.5, 0.0, 0.0);
    let rel = RelativePose::new(&pose_a, &pose_b);

    let mut last_depth = f32::INFINITY;
    for cap in 1..10 {
        let refiner = DepthRefiner::new(Vector::x(), 0.0, rel.b_in_a.translation.vector);
        let mut cfg = config();
        cfg.max_iterations = cap;
        let result = refiner.refine(|dir| minkowski_support(&a, &b, &rel, dir), &cfg);
        assert!(result.depth <= last_depth + 1.0e-6);
        last_depth = result.depth;
    }
}
