//! Layout document: the components plus their beam graph.
//!
//! Every editing operation borrows the current layout and returns a new one
//! (or an error), so callers never observe a half-applied edit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cfg::EngineCfg;
use crate::component::{Component, ComponentId, Components, Port};
use crate::error::{EngineError, EngineResult};
use crate::geom::{angle_to_direction, normalize_angle};
use crate::graph::BeamGraph;
use crate::physics::{check_connection, emitted_angle, output_power};
use crate::propagate::cast_to_boundary;
use crate::segment::{BeamSegment, SegmentId, SegmentIdGen};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LayoutDoc", into = "LayoutDoc")]
pub struct Layout {
    pub components: Components,
    pub graph: BeamGraph,
}

/// On-disk shape: `{"components": [...], "segments": [...]}`.
#[derive(Clone, Default, Serialize, Deserialize)]
struct LayoutDoc {
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    segments: Vec<BeamSegment>,
}

impl From<LayoutDoc> for Layout {
    fn from(doc: LayoutDoc) -> Self {
        let components = doc
            .components
            .into_iter()
            .map(|mut c| {
                c.angle = normalize_angle(c.angle);
                (c.id.clone(), c)
            })
            .collect();
        Self {
            components,
            graph: doc.segments.into(),
        }
    }
}

impl From<Layout> for LayoutDoc {
    fn from(l: Layout) -> Self {
        Self {
            components: l.components.into_values().collect(),
            segments: l.graph.into(),
        }
    }
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert (replaces a component with the same id).
    pub fn with_component(mut self, c: Component) -> Self {
        self.components.insert(c.id.clone(), c);
        self
    }

    pub fn with_segment(mut self, s: BeamSegment) -> Self {
        self.graph.add_segment(s);
        self
    }

    pub fn component(&self, id: &ComponentId) -> EngineResult<&Component> {
        self.components
            .get(id)
            .ok_or_else(|| EngineError::UnknownComponent(id.clone()))
    }

    /// Angle a beam leaves `c` through `port`, given what currently enters it.
    pub fn beam_output_angle(&self, c: &Component, port: Port) -> Option<f64> {
        emitted_angle(c, self.graph.incoming_angle(&c.id), port)
    }

    fn beam_output_power(&self, c: &Component, port: Port) -> f64 {
        let input = self.graph.incoming_power(&c.id).unwrap_or(1.0);
        output_power(c, input, port)
    }

    /// Validate and insert a segment `source --port--> target`.
    pub fn connect(
        &self,
        source: &ComponentId,
        target: &ComponentId,
        port: Port,
        ids: &mut SegmentIdGen,
        cfg: &EngineCfg,
    ) -> EngineResult<(Layout, SegmentId)> {
        let src = self.component(source)?;
        let dst = self.component(target)?;
        let incoming = self.graph.incoming_angle(source);
        let conn = check_connection(src, dst, port, incoming, cfg)?;
        let id = ids.next_id();
        let mut seg = BeamSegment::between(id.clone(), source.clone(), port, target.clone());
        seg.direction = Some(conn.beam_direction.into());
        seg.angle = Some(conn.beam_angle);
        seg.power = self.beam_output_power(src, port);
        seg.path_length = src.position.distance(dst.position);
        debug!(segment = %id, %source, %target, angle = conn.beam_angle, "connected");
        let mut next = self.clone();
        next.graph.add_segment(seg);
        Ok((next, id))
    }

    /// Emit a beam from `source` through `port` that ends at the workspace edge.
    pub fn extend_to_boundary(
        &self,
        source: &ComponentId,
        port: Port,
        ids: &mut SegmentIdGen,
        cfg: &EngineCfg,
    ) -> EngineResult<(Layout, SegmentId)> {
        let src = self.component(source)?;
        if !src.has_port(port) {
            return Err(EngineError::ConnectionInvalid(format!(
                "{} '{}' has no {:?} port",
                src.kind.name(),
                source,
                port
            )));
        }
        let angle = self.beam_output_angle(src, port).ok_or_else(|| {
            EngineError::ConnectionInvalid(format!("no beam leaves '{source}'"))
        })?;
        let (end, length) =
            cast_to_boundary(src.position, angle, &cfg.workspace, cfg.boundary_min_dist_mm)
                .ok_or_else(|| {
                    EngineError::ConnectionInvalid(format!(
                        "beam from '{source}' does not reach the workspace boundary"
                    ))
                })?;
        let id = ids.next_id();
        let mut seg = BeamSegment::to_boundary(id.clone(), source.clone(), port);
        seg.direction = Some(angle_to_direction(angle).into());
        seg.angle = Some(angle);
        seg.power = self.beam_output_power(src, port);
        seg.path_length = length;
        seg.end_point = Some(end);
        let mut next = self.clone();
        next.graph.add_segment(seg);
        Ok((next, id))
    }

    /// Remove a component, its segments, and every reference to it from other
    /// components' constraints.
    pub fn remove_component(&self, id: &ComponentId) -> EngineResult<Layout> {
        self.component(id)?;
        let mut next = self.clone();
        next.components.remove(id);
        next.graph.remove_all_for_component(id);
        for c in next.components.values_mut() {
            c.constraints.retain(|k| &k.partner != id);
            for k in c.constraints.iter_mut() {
                k.mirrors.retain(|m| m != id);
            }
        }
        Ok(next)
    }
}
