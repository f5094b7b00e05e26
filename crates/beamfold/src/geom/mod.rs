//! 2D geometry primitives for the optical bench.
//!
//! Purpose
//! - Angles are degrees everywhere in the public API and are normalized to
//!   `[0, 360)`. Angle 0 points along +x, angles grow towards +y.
//! - Vectors are `nalgebra::Vector2<f64>`; `Point2` is the serde-facing `{x, y}`
//!   shape used by layout documents.
//!
//! Code cross-refs: `physics::output_direction`, `fold::calculate`,
//! `propagate::boundary`.

mod angle;
mod types;

pub use angle::{
    angle_to_direction, angular_difference, deg_to_rad, direction_to_angle, normalize_angle,
    rad_to_deg, reflect_angle, reflect_direction,
};
pub use types::{rotate_about, Point2};
