//! Ray casting against the workspace rectangle.

use nalgebra::Vector2;

use crate::cfg::{Workspace, EPS_LEN};
use crate::geom::{angle_to_direction, Point2};

/// First point where a beam leaving `origin` along `angle` meets the workspace
/// edge, at least `min_dist` away. Returns the hit point and its distance.
pub fn cast_to_boundary(
    origin: Point2,
    angle: f64,
    ws: &Workspace,
    min_dist: f64,
) -> Option<(Point2, f64)> {
    let o = origin.to_vec();
    let d = angle_to_direction(angle);
    let edges = [
        (0, ws.min.x),
        (0, ws.max.x),
        (1, ws.min.y),
        (1, ws.max.y),
    ];
    let mut best: Option<(f64, Vector2<f64>)> = None;
    for (axis, value) in edges {
        if d[axis].abs() < EPS_LEN {
            continue;
        }
        let t = (value - o[axis]) / d[axis];
        if t < min_dist {
            continue;
        }
        let p = o + d * t;
        if !ws.contains(p.into()) {
            continue;
        }
        if best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, p));
        }
    }
    best.map(|(t, p)| (p.into(), t))
}
