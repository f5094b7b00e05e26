//! Point value type and rotation about a pivot.

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use super::angle::deg_to_rad;

/// A position on the workspace in millimetres, serialized as `{x, y}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    #[inline]
    pub fn to_vec(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
    #[inline]
    pub fn distance(self, other: Point2) -> f64 {
        (other.to_vec() - self.to_vec()).norm()
    }
    #[inline]
    pub fn offset(self, delta: Vector2<f64>) -> Point2 {
        (self.to_vec() + delta).into()
    }
}

impl From<Vector2<f64>> for Point2 {
    #[inline]
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Rotate `p` about `pivot` by `deg` degrees (counterclockwise in a y-up frame).
pub fn rotate_about(p: Point2, pivot: Point2, deg: f64) -> Point2 {
    let rot = Rotation2::new(deg_to_rad(deg));
    (pivot.to_vec() + rot * (p.to_vec() - pivot.to_vec())).into()
}
