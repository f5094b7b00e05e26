//! Optical components, their ports, and path-length constraints.
//!
//! The component kind is a closed enum so that every physics rule matches
//! exhaustively. Updates go through `ComponentPatch` and the pure
//! `Component::apply`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{normalize_angle, Point2};

/// Component identifier as used in layout documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller-owned component lookup. Ordered so every traversal is deterministic.
pub type Components = BTreeMap<ComponentId, Component>;

/// Beam ports a component may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Port {
    Output,
    Input,
    Reflected,
    Transmitted,
}

fn default_power() -> f64 {
    1.0
}

fn default_split_ratio() -> f64 {
    0.5
}

/// Component type with per-variant payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentKind {
    /// Emits along the component's own orientation.
    Source {
        #[serde(default = "default_power")]
        power: f64,
    },
    Mirror,
    BeamSplitter {
        /// Fraction of the incoming power that is transmitted.
        #[serde(default = "default_split_ratio", rename = "splitRatio")]
        split_ratio: f64,
        /// Custom reflective angle; shallow mode is active iff this is set.
        #[serde(default, rename = "shallowAngle", skip_serializing_if = "Option::is_none")]
        shallow_angle: Option<f64>,
    },
    Lens,
    Waveplate,
    Filter,
    Detector,
}

impl ComponentKind {
    pub fn ports(&self) -> &'static [Port] {
        match self {
            ComponentKind::Source { .. } => &[Port::Output],
            ComponentKind::Mirror => &[Port::Input, Port::Reflected],
            ComponentKind::BeamSplitter { .. } => &[Port::Input, Port::Reflected, Port::Transmitted],
            ComponentKind::Lens | ComponentKind::Waveplate | ComponentKind::Filter => {
                &[Port::Input, Port::Output]
            }
            ComponentKind::Detector => &[Port::Input],
        }
    }

    /// Lens, waveplate and filter: beams pass straight along the optical axis.
    pub fn is_transmissive(&self) -> bool {
        matches!(
            self,
            ComponentKind::Lens | ComponentKind::Waveplate | ComponentKind::Filter
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Source { .. } => "source",
            ComponentKind::Mirror => "mirror",
            ComponentKind::BeamSplitter { .. } => "beam splitter",
            ComponentKind::Lens => "lens",
            ComponentKind::Waveplate => "waveplate",
            ComponentKind::Filter => "filter",
            ComponentKind::Detector => "detector",
        }
    }
}

/// Which constraint mechanism owns a pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FoldMode {
    /// Explicit ordered mirror list realizes the folds.
    #[default]
    Foldable,
    /// Implicit pair without mirror list; supports rotating the pair together.
    Auto,
}

/// Fixed optical path length between this component and `partner`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConstraint {
    pub partner: ComponentId,
    pub fold_count: u8,
    pub target_length: f64,
    pub tolerance: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<ComponentId>,
    #[serde(default)]
    pub mode: FoldMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    #[serde(flatten)]
    pub kind: ComponentKind,
    pub position: Point2,
    pub angle: f64,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub is_angle_fixed: bool,
    #[serde(default)]
    pub allow_any_angle: bool,
    #[serde(default, rename = "pathConstraints", skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<PathConstraint>,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentKind, position: Point2, angle: f64) -> Self {
        Self {
            id: ComponentId(id.into()),
            kind,
            position,
            angle: normalize_angle(angle),
            is_fixed: false,
            is_angle_fixed: false,
            allow_any_angle: false,
            constraints: Vec::new(),
        }
    }

    pub fn ports(&self) -> &'static [Port] {
        self.kind.ports()
    }

    #[inline]
    pub fn has_port(&self, port: Port) -> bool {
        self.ports().contains(&port)
    }

    /// Beam-splitter shallow override, if active.
    pub fn shallow_angle(&self) -> Option<f64> {
        match self.kind {
            ComponentKind::BeamSplitter { shallow_angle, .. } => shallow_angle,
            _ => None,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_fixed = true;
        self
    }

    pub fn relaxed(mut self) -> Self {
        self.allow_any_angle = true;
        self
    }

    pub fn with_constraint(mut self, c: PathConstraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Pure update: returns a new component with `patch` applied.
    pub fn apply(&self, patch: &ComponentPatch) -> Component {
        let mut next = self.clone();
        if let Some(p) = patch.position {
            next.position = p;
        }
        if let Some(a) = patch.angle {
            next.angle = normalize_angle(a);
        }
        if let Some(f) = patch.is_fixed {
            next.is_fixed = f;
        }
        if let Some(f) = patch.is_angle_fixed {
            next.is_angle_fixed = f;
        }
        if let Some(f) = patch.allow_any_angle {
            next.allow_any_angle = f;
        }
        if let Some(cs) = &patch.constraints {
            next.constraints = cs.clone();
        }
        next
    }
}

/// Partial update of a component. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentPatch {
    pub position: Option<Point2>,
    pub angle: Option<f64>,
    pub is_fixed: Option<bool>,
    pub is_angle_fixed: Option<bool>,
    pub allow_any_angle: Option<bool>,
    pub constraints: Option<Vec<PathConstraint>>,
}

impl ComponentPatch {
    pub fn position(p: Point2) -> Self {
        Self {
            position: Some(p),
            ..Self::default()
        }
    }

    pub fn angle(a: f64) -> Self {
        Self {
            angle: Some(a),
            ..Self::default()
        }
    }

    pub fn pose(p: Point2, a: f64) -> Self {
        Self {
            position: Some(p),
            angle: Some(a),
            ..Self::default()
        }
    }

    /// Combine two patches; fields set in `later` win.
    pub fn merge(self, later: ComponentPatch) -> ComponentPatch {
        ComponentPatch {
            position: later.position.or(self.position),
            angle: later.angle.or(self.angle),
            is_fixed: later.is_fixed.or(self.is_fixed),
            is_angle_fixed: later.is_angle_fixed.or(self.is_angle_fixed),
            allow_any_angle: later.allow_any_angle.or(self.allow_any_angle),
            constraints: later.constraints.or(self.constraints),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ComponentPatch::default()
    }
}
