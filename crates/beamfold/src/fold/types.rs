//! Value types produced by the fold solver.

use nalgebra::Vector2;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::cfg::EPS_LEN;
use crate::component::Component;
use crate::error::EngineError;
use crate::geom::{direction_to_angle, normalize_angle, Point2};

/// Position and orientation of one end of a constrained pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Endpoint {
    pub position: Point2,
    pub angle: f64,
}

impl Endpoint {
    pub fn new(position: Point2, angle: f64) -> Self {
        Self { position, angle }
    }
}

impl From<&Component> for Endpoint {
    fn from(c: &Component) -> Self {
        Self::new(c.position, c.angle)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SubSegment {
    pub start: Point2,
    pub end: Point2,
    pub length: f64,
}

impl SubSegment {
    fn direction(&self) -> Option<Vector2<f64>> {
        let v = self.end.to_vec() - self.start.to_vec();
        let n = v.norm();
        (n > EPS_LEN).then(|| v / n)
    }
}

/// Why a fold layout could not be realized.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FoldError {
    #[error("target length {0}mm is not a valid path length")]
    InvalidTarget(f64),
    #[error("straight distance {distance:.1}mm does not match target {target:.1}mm (tolerance {tolerance:.1}mm)")]
    DistanceMismatch {
        distance: f64,
        target: f64,
        tolerance: f64,
    },
    #[error("beam directions are not perpendicular (|cos| = {dot:.2})")]
    NotPerpendicular { dot: f64 },
    #[error("beam rays are parallel, no fold point exists")]
    ParallelRays,
    #[error("fold point lies behind an endpoint (t1 = {t1:.1}mm, t2 = {t2:.1}mm)")]
    BehindEndpoint { t1: f64, t2: f64 },
    #[error("fold point estimates disagree by {gap:.2}mm")]
    FoldPointDisagreement { gap: f64 },
    #[error("folded length {actual:.1}mm does not match target {target:.1}mm (tolerance {tolerance:.1}mm)")]
    LengthMismatch {
        actual: f64,
        target: f64,
        tolerance: f64,
    },
    #[error("endpoints do not face opposite directions (cos = {dot:.2})")]
    NotOpposite { dot: f64 },
    #[error("target {target:.1}mm is shorter than the {middle:.1}mm middle leg")]
    NegativeSideLength { target: f64, middle: f64 },
    #[error("second fold misses the target endpoint by {gap:.2}mm")]
    SecondFoldMismatch { gap: f64 },
    #[error("fold count {0} is not supported")]
    UnsupportedCount(u8),
}

impl Serialize for FoldError {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl From<FoldError> for EngineError {
    fn from(e: FoldError) -> Self {
        match e {
            FoldError::DistanceMismatch {
                distance: actual,
                target,
                tolerance,
            }
            | FoldError::LengthMismatch {
                actual,
                target,
                tolerance,
            } => EngineError::LengthMismatch {
                actual,
                target,
                tolerance,
            },
            other => EngineError::GeometryInfeasible(other.to_string()),
        }
    }
}

/// Solver output. On failure `folds` holds whatever fold points were found.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldGeometry {
    pub valid: bool,
    pub fold_count: u8,
    pub folds: Vec<Point2>,
    pub segments: Vec<SubSegment>,
    pub error: Option<FoldError>,
}

impl FoldGeometry {
    pub(crate) fn solved(fold_count: u8, folds: Vec<Point2>, segments: Vec<SubSegment>) -> Self {
        Self {
            valid: true,
            fold_count,
            folds,
            segments,
            error: None,
        }
    }

    pub(crate) fn failed(fold_count: u8, folds: Vec<Point2>, error: FoldError) -> Self {
        Self {
            valid: false,
            fold_count,
            folds,
            segments: Vec::new(),
            error: Some(error),
        }
    }

    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Mirror orientation at each fold point that turns sub-segment `i` into
    /// sub-segment `i + 1`, reduced to `[0, 180)`. `None` where either leg has
    /// zero length or the beam does not turn.
    pub fn mirror_angles(&self) -> Vec<Option<f64>> {
        self.segments
            .windows(2)
            .map(|w| {
                let din = w[0].direction()?;
                let dout = w[1].direction()?;
                let normal = dout - din;
                if normal.norm() < EPS_LEN {
                    return None;
                }
                Some(normalize_angle(direction_to_angle(normal) - 90.0) % 180.0)
            })
            .collect()
    }
}
