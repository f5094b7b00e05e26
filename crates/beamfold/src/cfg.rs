//! Engine tolerances and workspace bounds.
//!
//! Policy
//! - Numerical guard constants are fixed (`EPS_*`); the physically meaningful
//!   tolerances live in `EngineCfg` so callers can load overrides from a file.

use serde::{Deserialize, Serialize};

use crate::geom::Point2;

/// Determinant threshold below which two rays are treated as parallel.
pub(crate) const EPS_DET: f64 = 1e-10;
/// Distance below which a direction vector is treated as zero.
pub(crate) const EPS_LEN: f64 = 1e-9;
/// Slack when testing whether a boundary hit lies on the workspace edge.
pub(crate) const EPS_EDGE: f64 = 1e-6;
/// Rotations smaller than this (degrees) count as no rotation.
pub(crate) const EPS_ANGLE: f64 = 1e-9;

/// Default depth cap for beam tracing.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Rectangular layout area, `min` inclusive to `max` inclusive (mm).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub min: Point2,
    pub max: Point2,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            min: Point2::new(0.0, 0.0),
            max: Point2::new(1200.0, 800.0),
        }
    }
}

impl Workspace {
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.min.x - EPS_EDGE
            && p.x <= self.max.x + EPS_EDGE
            && p.y >= self.min.y - EPS_EDGE
            && p.y <= self.max.y + EPS_EDGE
    }
}

/// Engine configuration (tolerances in degrees / millimetres).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    /// Output-ray and optical-axis tolerance for strict components.
    pub angle_tol_deg: f64,
    /// Widened tolerance when either endpoint has `allow_any_angle`.
    pub relaxed_angle_tol_deg: f64,
    /// Fold solver length tolerance is `max(length_tol_frac * target, length_tol_min_mm)`.
    pub length_tol_frac: f64,
    pub length_tol_min_mm: f64,
    /// 1-fold: rays count as perpendicular when `|d1·d2| <= perpendicular_dot_tol`.
    pub perpendicular_dot_tol: f64,
    /// 2-fold: rays count as opposite when `d1·d2 < opposite_dot_max`.
    pub opposite_dot_max: f64,
    /// Agreement of the fold point computed from each ray (1-fold).
    pub one_fold_agreement_mm: f64,
    /// Agreement of the second fold point walked from both ends (2-fold).
    pub two_fold_agreement_mm: f64,
    pub max_trace_depth: usize,
    /// Boundary hits closer than this to the ray origin are ignored.
    pub boundary_min_dist_mm: f64,
    pub workspace: Workspace,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            angle_tol_deg: 5.0,
            relaxed_angle_tol_deg: 30.0,
            length_tol_frac: 0.05,
            length_tol_min_mm: 5.0,
            perpendicular_dot_tol: 0.2,
            opposite_dot_max: -0.7,
            one_fold_agreement_mm: 1.0,
            two_fold_agreement_mm: 2.0,
            max_trace_depth: DEFAULT_MAX_DEPTH,
            boundary_min_dist_mm: 1.0,
            workspace: Workspace::default(),
        }
    }
}

impl EngineCfg {
    /// Length tolerance used by the fold solver for `target` mm.
    #[inline]
    pub fn length_tolerance(&self, target: f64) -> f64 {
        (self.length_tol_frac * target).max(self.length_tol_min_mm)
    }

    #[inline]
    pub fn angle_tolerance(&self, relaxed: bool) -> f64 {
        if relaxed {
            self.relaxed_angle_tol_deg
        } else {
            self.angle_tol_deg
        }
    }
}
