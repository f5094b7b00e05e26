use super::*;
use crate::cfg::EngineCfg;
use crate::error::EngineError;
use crate::geom::{angular_difference, reflect_angle, Point2};
use proptest::prelude::*;

fn ep(x: f64, y: f64, angle: f64) -> Endpoint {
    Endpoint::new(Point2::new(x, y), angle)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn fold_count_buckets() {
    assert_eq!(determine_fold_count(0.0, 0.0), 0);
    assert_eq!(determine_fold_count(0.0, 44.9), 0);
    assert_eq!(determine_fold_count(0.0, 45.0), 1);
    assert_eq!(determine_fold_count(0.0, 90.0), 1);
    assert_eq!(determine_fold_count(0.0, 135.0), 1);
    assert_eq!(determine_fold_count(0.0, 180.0), 2);
    assert_eq!(determine_fold_count(350.0, 10.0), 0);
    assert_eq!(determine_fold_count(10.0, 200.0), 2);
}

#[test]
fn zero_fold_straight_line() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(100.0, 0.0, 0.0), 100.0, &cfg);
    assert!(g.valid);
    assert_eq!(g.fold_count, 0);
    assert!(g.folds.is_empty());
    assert_eq!(g.segments.len(), 1);
    assert!(close(g.segments[0].length, 100.0));
}

#[test]
fn zero_fold_tolerance_is_five_percent_or_five_mm() {
    let cfg = EngineCfg::default();
    // 5% of 200 = 10mm.
    assert!(calculate(ep(0.0, 0.0, 0.0), ep(209.0, 0.0, 0.0), 200.0, &cfg).valid);
    let g = calculate(ep(0.0, 0.0, 0.0), ep(211.0, 0.0, 0.0), 200.0, &cfg);
    assert!(!g.valid);
    assert!(matches!(g.error, Some(FoldError::DistanceMismatch { .. })));
    // Floor of 5mm for short targets.
    assert!(calculate(ep(0.0, 0.0, 0.0), ep(24.0, 0.0, 0.0), 20.0, &cfg).valid);
    assert!(!calculate(ep(0.0, 0.0, 0.0), ep(26.0, 0.0, 0.0), 20.0, &cfg).valid);
}

#[test]
fn one_fold_l_shape() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(100.0, 100.0, 90.0), 200.0, &cfg);
    assert!(g.valid, "{:?}", g.error);
    assert_eq!(g.fold_count, 1);
    assert_eq!(g.segments.len(), 2);
    assert!((g.total_length() - 200.0).abs() < 1e-9);
    assert!((g.segments[0].length - 100.0).abs() < 1e-9);
    assert!((g.segments[1].length - 100.0).abs() < 1e-9);
    let f = g.folds[0];
    assert!((f.x - 100.0).abs() < 1e-9 && f.y.abs() < 1e-9);
}

#[test]
fn one_fold_mirror_angle_turns_beam() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(100.0, 100.0, 90.0), 200.0, &cfg);
    let angles = g.mirror_angles();
    assert_eq!(angles.len(), 1);
    let mirror = angles[0].unwrap();
    assert!(angular_difference(mirror, 45.0) < 1e-9);
    assert!(angular_difference(reflect_angle(0.0, mirror), 90.0) < 1e-9);
}

#[test]
fn one_fold_length_mismatch_keeps_fold_point() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(100.0, 100.0, 90.0), 300.0, &cfg);
    assert!(!g.valid);
    assert_eq!(g.folds.len(), 1);
    assert!(g.segments.is_empty());
    let err: EngineError = g.error.unwrap().into();
    assert!(matches!(err, EngineError::LengthMismatch { .. }));
}

#[test]
fn one_fold_behind_endpoint() {
    let cfg = EngineCfg::default();
    // Target sits behind the source's emitted ray.
    let g = calculate(ep(0.0, 0.0, 0.0), ep(-100.0, 100.0, 90.0), 200.0, &cfg);
    assert!(!g.valid);
    assert!(matches!(g.error, Some(FoldError::BehindEndpoint { .. })));
    assert_eq!(g.folds.len(), 1);
}

#[test]
fn one_fold_rejects_non_perpendicular() {
    let cfg = EngineCfg::default();
    let g = calculate_with_count(ep(0.0, 0.0, 0.0), ep(100.0, 100.0, 30.0), 200.0, 1, &cfg);
    assert!(!g.valid);
    assert!(matches!(g.error, Some(FoldError::NotPerpendicular { .. })));
}

#[test]
fn one_fold_parallel_rays_are_degenerate() {
    let mut cfg = EngineCfg::default();
    cfg.perpendicular_dot_tol = 1.0;
    let g = calculate_with_count(ep(0.0, 0.0, 0.0), ep(100.0, 0.0, 0.0), 100.0, 1, &cfg);
    assert!(matches!(g.error, Some(FoldError::ParallelRays)));
}

#[test]
fn two_fold_u_shape() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(0.0, 50.0, 180.0), 250.0, &cfg);
    assert!(g.valid, "{:?}", g.error);
    assert_eq!(g.fold_count, 2);
    assert_eq!(g.segments.len(), 3);
    assert!((g.total_length() - 250.0).abs() < 1e-9);
    assert!((g.segments[0].length - g.segments[2].length).abs() < 1e-9);
    assert!((g.segments[0].length - 100.0).abs() < 1e-9);
    assert!((g.segments[1].length - 50.0).abs() < 1e-9);
    assert!((g.folds[0].x - 100.0).abs() < 1e-9);
    assert!((g.folds[1].y - 50.0).abs() < 1e-9);
    let angles: Vec<f64> = g.mirror_angles().into_iter().flatten().collect();
    assert_eq!(angles.len(), 2);
    assert!(angular_difference(reflect_angle(0.0, angles[0]), 90.0) < 1e-9);
    assert!(angular_difference(reflect_angle(90.0, angles[1]), 180.0) < 1e-9);
}

#[test]
fn two_fold_rejects_short_target_and_offset_endpoints() {
    let cfg = EngineCfg::default();
    let short = calculate(ep(0.0, 0.0, 0.0), ep(0.0, 50.0, 180.0), 40.0, &cfg);
    assert!(matches!(short.error, Some(FoldError::NegativeSideLength { .. })));
    assert!(short.folds.is_empty());

    // Target shifted along the emitted ray: the second fold cannot reach it.
    let shifted = calculate(ep(0.0, 0.0, 0.0), ep(30.0, 50.0, 180.0), 250.0, &cfg);
    assert!(matches!(shifted.error, Some(FoldError::SecondFoldMismatch { .. })));
    assert_eq!(shifted.folds.len(), 2);
}

#[test]
fn two_fold_rejects_non_opposite() {
    let cfg = EngineCfg::default();
    let g = calculate_with_count(ep(0.0, 0.0, 0.0), ep(0.0, 50.0, 90.0), 250.0, 2, &cfg);
    assert!(matches!(g.error, Some(FoldError::NotOpposite { .. })));
}

#[test]
fn invalid_target_and_count() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(1.0, 0.0, 0.0), f64::NAN, &cfg);
    assert!(matches!(g.error, Some(FoldError::InvalidTarget(_))));
    let g = calculate_with_count(ep(0.0, 0.0, 0.0), ep(1.0, 0.0, 0.0), 1.0, 3, &cfg);
    assert!(matches!(g.error, Some(FoldError::UnsupportedCount(3))));
}

#[test]
fn geometry_serializes_error_as_string() {
    let cfg = EngineCfg::default();
    let g = calculate(ep(0.0, 0.0, 0.0), ep(300.0, 0.0, 0.0), 100.0, &cfg);
    let v = serde_json::to_value(&g).unwrap();
    assert_eq!(v["valid"], false);
    assert_eq!(v["foldCount"], 0);
    assert!(v["error"].as_str().unwrap().contains("does not match"));
}

proptest! {
    #[test]
    fn fold_count_is_symmetric(a in -720.0f64..720.0, b in -720.0f64..720.0) {
        prop_assert_eq!(determine_fold_count(a, b), determine_fold_count(b, a));
    }

    #[test]
    fn valid_l_shapes_sum_to_target(x in 10.0f64..500.0, y in 10.0f64..500.0) {
        let cfg = EngineCfg::default();
        let g = calculate(ep(0.0, 0.0, 0.0), ep(x, y, 90.0), x + y, &cfg);
        prop_assert!(g.valid);
        prop_assert!((g.total_length() - (x + y)).abs() < 1e-6);
    }
}
