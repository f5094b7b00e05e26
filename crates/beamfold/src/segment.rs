//! Directed beam segments between components.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentId, Port};
use crate::geom::Point2;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub String);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Caller-owned segment id counter. Ids are `seg-<n>` in creation order.
#[derive(Clone, Debug, Default)]
pub struct SegmentIdGen {
    next: u64,
}

impl SegmentIdGen {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> SegmentId {
        let id = SegmentId(format!("seg-{}", self.next));
        self.next += 1;
        id
    }
}

/// A beam segment. `target == None` means the beam ends at the workspace
/// boundary, at `end_point`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamSegment {
    pub id: SegmentId,
    pub source: ComponentId,
    pub target: Option<ComponentId>,
    pub source_port: Port,
    pub target_port: Option<Port>,
    /// Unit vector when present.
    pub direction: Option<Point2>,
    pub angle: Option<f64>,
    pub power: f64,
    pub path_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_length: Option<f64>,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub branch: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Point2>,
}

fn default_valid() -> bool {
    true
}

impl BeamSegment {
    /// Segment between two components with no geometry filled in yet.
    pub fn between(
        id: SegmentId,
        source: ComponentId,
        source_port: Port,
        target: ComponentId,
    ) -> Self {
        Self {
            id,
            source,
            target: Some(target),
            source_port,
            target_port: Some(Port::Input),
            direction: None,
            angle: None,
            power: 1.0,
            path_length: 0.0,
            fixed_length: None,
            valid: true,
            error: None,
            branch: 0,
            end_point: None,
        }
    }

    /// Segment leaving `source` towards the workspace boundary.
    pub fn to_boundary(id: SegmentId, source: ComponentId, source_port: Port) -> Self {
        Self {
            target: None,
            target_port: None,
            ..Self::between(id, source.clone(), source_port, source)
        }
    }

    pub fn with_fixed_length(mut self, len: f64) -> Self {
        self.fixed_length = Some(len.max(0.0));
        self.path_length = len.max(0.0);
        self
    }

    /// Path length honouring the fixed-length override.
    pub fn effective_length(&self, geometric: f64) -> f64 {
        self.fixed_length.unwrap_or(geometric).max(0.0)
    }

    /// Pure update: returns a new segment with `patch` applied.
    pub fn apply(&self, patch: &SegmentPatch) -> BeamSegment {
        let mut next = self.clone();
        if let Some(d) = patch.direction {
            next.direction = Some(d);
        }
        if let Some(a) = patch.angle {
            next.angle = Some(a);
        }
        if let Some(p) = patch.power {
            next.power = p;
        }
        if let Some(len) = patch.path_length {
            next.path_length = next.effective_length(len);
        }
        if let Some(end) = patch.end_point {
            next.end_point = end;
        }
        if let Some((valid, err)) = &patch.validity {
            next.valid = *valid;
            next.error = err.clone();
        }
        if let Some(b) = patch.branch {
            next.branch = b;
        }
        next
    }
}

/// Partial update of a segment. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentPatch {
    pub direction: Option<Point2>,
    pub angle: Option<f64>,
    pub power: Option<f64>,
    /// Geometric length; a fixed-length override still wins.
    pub path_length: Option<f64>,
    /// `Some(None)` clears the end point.
    pub end_point: Option<Option<Point2>>,
    pub validity: Option<(bool, Option<String>)>,
    pub branch: Option<u32>,
}
