//! Closed-form 0/1/2-fold solves.

use nalgebra::{Matrix2, Vector2};
use tracing::debug;

use crate::cfg::{EngineCfg, EPS_DET};
use crate::geom::{angle_to_direction, angular_difference};

use super::types::{Endpoint, FoldError, FoldGeometry, SubSegment};

/// Folds needed between two orientations: `< 45°` apart → 0 (straight),
/// `45°..=135°` → 1 (L-shape), `> 135°` → 2 (U-shape). Symmetric in its arguments.
pub fn determine_fold_count(angle1: f64, angle2: f64) -> u8 {
    let d = angular_difference(angle1, angle2);
    if d < 45.0 {
        0
    } else if d <= 135.0 {
        1
    } else {
        2
    }
}

/// Solve with the fold count implied by the endpoint orientations.
pub fn calculate(from: Endpoint, to: Endpoint, target_length: f64, cfg: &EngineCfg) -> FoldGeometry {
    let count = determine_fold_count(from.angle, to.angle);
    calculate_with_count(from, to, target_length, count, cfg)
}

/// Solve for a prescribed fold count.
pub fn calculate_with_count(
    from: Endpoint,
    to: Endpoint,
    target_length: f64,
    fold_count: u8,
    cfg: &EngineCfg,
) -> FoldGeometry {
    if !target_length.is_finite() || target_length < 0.0 {
        return FoldGeometry::failed(fold_count, Vec::new(), FoldError::InvalidTarget(target_length));
    }
    let geom = match fold_count {
        0 => solve_zero_fold(from, to, target_length, cfg),
        1 => solve_one_fold(from, to, target_length, cfg),
        2 => solve_two_fold(from, to, target_length, cfg),
        n => FoldGeometry::failed(n, Vec::new(), FoldError::UnsupportedCount(n)),
    };
    if let Some(err) = &geom.error {
        debug!(fold_count, target_length, %err, "fold solve rejected");
    }
    geom
}

/// Straight line: valid iff the endpoint distance matches the target.
pub fn solve_zero_fold(from: Endpoint, to: Endpoint, target_length: f64, cfg: &EngineCfg) -> FoldGeometry {
    let distance = from.position.distance(to.position);
    let tolerance = cfg.length_tolerance(target_length);
    if (distance - target_length).abs() > tolerance {
        return FoldGeometry::failed(
            0,
            Vec::new(),
            FoldError::DistanceMismatch {
                distance,
                target: target_length,
                tolerance,
            },
        );
    }
    FoldGeometry::solved(
        0,
        Vec::new(),
        vec![SubSegment {
            start: from.position,
            end: to.position,
            length: distance,
        }],
    )
}

/// L-shape: intersect the emitted ray with the ray walked back from the target.
pub fn solve_one_fold(from: Endpoint, to: Endpoint, target_length: f64, cfg: &EngineCfg) -> FoldGeometry {
    let p1 = from.position.to_vec();
    let p2 = to.position.to_vec();
    let d1 = angle_to_direction(from.angle);
    let d2 = angle_to_direction(to.angle + 180.0);

    let dot = d1.dot(&d2);
    if dot.abs() > cfg.perpendicular_dot_tol {
        return FoldGeometry::failed(1, Vec::new(), FoldError::NotPerpendicular { dot: dot.abs() });
    }

    // p1 + t1 d1 = p2 + t2 d2  ⇔  [d1 | −d2] (t1, t2)ᵀ = p2 − p1
    let m = Matrix2::from_columns(&[d1, -d2]);
    let det = m.determinant();
    if det.abs() < EPS_DET {
        return FoldGeometry::failed(1, Vec::new(), FoldError::ParallelRays);
    }
    let rhs = p2 - p1;
    let t1 = Matrix2::from_columns(&[rhs, -d2]).determinant() / det;
    let t2 = Matrix2::from_columns(&[d1, rhs]).determinant() / det;

    let fold_a = p1 + d1 * t1;
    let fold_b = p2 + d2 * t2;
    let folds = vec![fold_a.into()];
    if t1 < -EPS_DET || t2 < -EPS_DET {
        return FoldGeometry::failed(1, folds, FoldError::BehindEndpoint { t1, t2 });
    }
    let gap = (fold_a - fold_b).norm();
    if gap > cfg.one_fold_agreement_mm {
        return FoldGeometry::failed(1, folds, FoldError::FoldPointDisagreement { gap });
    }
    let actual = t1 + t2;
    let tolerance = cfg.length_tolerance(target_length);
    if (actual - target_length).abs() > tolerance {
        return FoldGeometry::failed(
            1,
            folds,
            FoldError::LengthMismatch {
                actual,
                target: target_length,
                tolerance,
            },
        );
    }
    let segments = vec![
        SubSegment {
            start: from.position,
            end: folds[0],
            length: t1,
        },
        SubSegment {
            start: folds[0],
            end: to.position,
            length: t2,
        },
    ];
    FoldGeometry::solved(1, folds, segments)
}

/// U-shape: equal outer legs, middle leg perpendicular to the emitted ray.
pub fn solve_two_fold(from: Endpoint, to: Endpoint, target_length: f64, cfg: &EngineCfg) -> FoldGeometry {
    let p1 = from.position.to_vec();
    let p2 = to.position.to_vec();
    let d1 = angle_to_direction(from.angle);
    let d2 = angle_to_direction(to.angle);

    let dot = d1.dot(&d2);
    if dot >= cfg.opposite_dot_max {
        return FoldGeometry::failed(2, Vec::new(), FoldError::NotOpposite { dot });
    }

    let axis = Vector2::new(-d1.y, d1.x);
    let offset = (p2 - p1).dot(&axis);
    let middle = offset.abs();
    let side = (target_length - middle) / 2.0;
    if side < 0.0 {
        return FoldGeometry::failed(
            2,
            Vec::new(),
            FoldError::NegativeSideLength {
                target: target_length,
                middle,
            },
        );
    }

    let fold_a = p1 + d1 * side;
    let fold_b = fold_a + axis * offset;
    let fold_b_back = p2 - d2 * side;
    let folds = vec![fold_a.into(), fold_b.into()];
    let gap = (fold_b - fold_b_back).norm();
    if gap > cfg.two_fold_agreement_mm {
        return FoldGeometry::failed(2, folds, FoldError::SecondFoldMismatch { gap });
    }
    let segments = vec![
        SubSegment {
            start: from.position,
            end: folds[0],
            length: side,
        },
        SubSegment {
            start: folds[0],
            end: folds[1],
            length: middle,
        },
        SubSegment {
            start: folds[1],
            end: to.position,
            length: side,
        },
    ];
    FoldGeometry::solved(2, folds, segments)
}
