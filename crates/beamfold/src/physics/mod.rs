//! Beam physics: per-kind output rules, reflection, and connection validation.
//!
//! - `output_direction`: where a beam leaves a component for a given port.
//! - `validate_connection`: the gate every new segment passes through.
//! - `snap`: legal orientations per component kind.
//!
//! Obstacles between source and target are not considered.

mod snap;

use nalgebra::Vector2;
use serde::Serialize;

use crate::cfg::{EngineCfg, EPS_LEN};
use crate::component::{Component, ComponentId, ComponentKind, Components, Port};
use crate::error::{EngineError, EngineResult};
use crate::geom::{angular_difference, direction_to_angle, normalize_angle, reflect_angle, Point2};

pub use snap::{snap_angle_to_valid, valid_angles};

/// Outgoing beam angle for a beam entering `component` along `input_angle`.
/// `None` for terminal components.
pub fn output_direction(component: &Component, input_angle: f64, port: Port) -> Option<f64> {
    match &component.kind {
        ComponentKind::Source { .. } => Some(component.angle),
        ComponentKind::Mirror => Some(reflect_angle(input_angle, component.angle)),
        ComponentKind::BeamSplitter { shallow_angle, .. } => match port {
            Port::Transmitted => Some(normalize_angle(input_angle)),
            _ => {
                let surface = shallow_angle.unwrap_or(component.angle);
                Some(reflect_angle(input_angle, surface))
            }
        },
        ComponentKind::Lens | ComponentKind::Waveplate | ComponentKind::Filter => {
            Some(normalize_angle(input_angle))
        }
        ComponentKind::Detector => None,
    }
}

/// Angle a beam leaves `component` through `port`, given the angle of the beam
/// entering it. Sources emit regardless of input.
pub fn emitted_angle(component: &Component, incoming: Option<f64>, port: Port) -> Option<f64> {
    match component.kind {
        ComponentKind::Source { .. } => Some(component.angle),
        _ => incoming.and_then(|a| output_direction(component, a, port)),
    }
}

/// Scalar power leaving `component` through `port` for `input_power` in.
pub fn output_power(component: &Component, input_power: f64, port: Port) -> f64 {
    match &component.kind {
        ComponentKind::Source { power } => *power,
        ComponentKind::BeamSplitter { split_ratio, .. } => match port {
            Port::Transmitted => input_power * split_ratio,
            _ => input_power * (1.0 - split_ratio),
        },
        _ => input_power,
    }
}

/// An accepted connection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    pub beam_angle: f64,
    pub beam_direction: Vector2<f64>,
}

/// Caller-facing validation result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub valid: bool,
    pub error: Option<String>,
    pub beam_angle: Option<f64>,
    pub beam_direction: Option<Point2>,
}

impl From<EngineResult<Connection>> for ConnectionResult {
    fn from(r: EngineResult<Connection>) -> Self {
        match r {
            Ok(c) => Self {
                valid: true,
                error: None,
                beam_angle: Some(c.beam_angle),
                beam_direction: Some(c.beam_direction.into()),
            },
            Err(e) => Self {
                valid: false,
                error: Some(e.to_string()),
                beam_angle: None,
                beam_direction: None,
            },
        }
    }
}

/// Validate a candidate segment `source --source_port--> target` by id.
pub fn validate_connection(
    components: &Components,
    source_id: &ComponentId,
    target_id: &ComponentId,
    source_port: Port,
    incoming_angle: Option<f64>,
    cfg: &EngineCfg,
) -> ConnectionResult {
    let lookup = |id: &ComponentId| {
        components
            .get(id)
            .ok_or_else(|| EngineError::UnknownComponent(id.clone()))
    };
    let checked = lookup(source_id).and_then(|source| {
        let target = lookup(target_id)?;
        check_connection(source, target, source_port, incoming_angle, cfg)
    });
    checked.into()
}

/// Typed form of `validate_connection`.
pub fn check_connection(
    source: &Component,
    target: &Component,
    source_port: Port,
    incoming_angle: Option<f64>,
    cfg: &EngineCfg,
) -> EngineResult<Connection> {
    let invalid = |msg: String| Err(EngineError::ConnectionInvalid(msg));
    if source.id == target.id {
        return invalid(format!("{} cannot feed itself", source.id));
    }
    if !source.has_port(source_port) || matches!(source.kind, ComponentKind::Detector) {
        return invalid(format!(
            "{} '{}' cannot emit from its {:?} port",
            source.kind.name(),
            source.id,
            source_port
        ));
    }
    if !target.has_port(Port::Input) {
        return invalid(format!(
            "{} '{}' cannot receive a beam",
            target.kind.name(),
            target.id
        ));
    }

    let delta = target.position.to_vec() - source.position.to_vec();
    let dist = delta.norm();
    if dist < EPS_LEN {
        return invalid(format!("'{}' and '{}' coincide", source.id, target.id));
    }
    let beam_direction = delta / dist;
    let beam_angle = direction_to_angle(delta);

    let source_relaxed = source.allow_any_angle;
    let target_relaxed = target.allow_any_angle;
    let tol = cfg.angle_tolerance(source_relaxed || target_relaxed);

    if !source_relaxed {
        let expected = expected_output(source, source_port, incoming_angle)?;
        let dev = angular_difference(beam_angle, expected);
        if dev > tol {
            return invalid(format!(
                "'{}' is {:.1}° off the {:.1}° output ray of '{}' (tolerance {:.0}°)",
                target.id, dev, expected, source.id, tol
            ));
        }
    }

    if target.kind.is_transmissive() && !target_relaxed {
        let axis_dev = angular_difference(beam_angle, target.angle)
            .min(angular_difference(beam_angle, target.angle + 180.0));
        if axis_dev > tol {
            return invalid(format!(
                "beam enters {} '{}' {:.1}° off its optical axis",
                target.kind.name(),
                target.id,
                axis_dev
            ));
        }
    }

    Ok(Connection {
        beam_angle,
        beam_direction,
    })
}

fn expected_output(source: &Component, port: Port, incoming: Option<f64>) -> EngineResult<f64> {
    if let ComponentKind::Source { .. } = source.kind {
        return Ok(source.angle);
    }
    let input = incoming.ok_or_else(|| {
        EngineError::ConnectionInvalid(format!("no incoming beam reaches '{}'", source.id))
    })?;
    output_direction(source, input, port).ok_or_else(|| {
        EngineError::ConnectionInvalid(format!(
            "{} '{}' is terminal",
            source.kind.name(),
            source.id
        ))
    })
}

#[cfg(test)]
mod tests;
