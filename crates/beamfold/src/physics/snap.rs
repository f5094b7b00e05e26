//! Legal orientations per component kind and nearest-angle snapping.

use crate::component::{Component, ComponentKind};
use crate::geom::{angular_difference, normalize_angle};

const CARDINALS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];
const DIAGONALS: [f64; 2] = [45.0, 135.0];

fn multiples_of(step: f64) -> Vec<f64> {
    let n = (360.0 / step).round() as usize;
    (0..n).map(|k| k as f64 * step).collect()
}

/// Orientations a component may take. `allow_any_angle` widens every kind
/// to all multiples of 15°.
pub fn valid_angles(component: &Component) -> Vec<f64> {
    if component.allow_any_angle {
        return multiples_of(15.0);
    }
    match &component.kind {
        ComponentKind::BeamSplitter {
            shallow_angle: Some(s),
            ..
        } => vec![
            normalize_angle(*s),
            normalize_angle(180.0 - s),
            normalize_angle(180.0 + s),
            normalize_angle(360.0 - s),
        ],
        ComponentKind::Mirror | ComponentKind::BeamSplitter { .. } => DIAGONALS.to_vec(),
        ComponentKind::Source { .. }
        | ComponentKind::Lens
        | ComponentKind::Waveplate
        | ComponentKind::Filter => CARDINALS.to_vec(),
        ComponentKind::Detector => multiples_of(45.0),
    }
}

/// Nearest legal orientation by circular distance (first wins on ties).
pub fn snap_angle_to_valid(component: &Component, angle: f64) -> f64 {
    let mut best = normalize_angle(angle);
    let mut best_d = f64::INFINITY;
    for cand in valid_angles(component) {
        let d = angular_difference(angle, cand);
        if d < best_d {
            best_d = d;
            best = cand;
        }
    }
    best
}
