//! Beam-path graph: arena-indexed segment store with adjacency indices.
//!
//! Purpose
//! - Own every segment of a layout, addressed by integer slot. Segment ids map
//!   to slots; outgoing/incoming adjacency maps component ids to ordered slot
//!   lists. Adjacency order is insertion order, so the first outgoing segment of
//!   a beam splitter is the one authored first (reflected before transmitted).
//! - Removed segments leave a tombstone slot; slots are never reused, so slot
//!   numbers held during a traversal stay meaningful.
//!
//! Invariants
//! - Every slot in an adjacency list is live and present in `index`.
//! - `path_length >= 0`; fixed-length segments keep their override.
//!
//! Code cross-refs: `trace` (path enumeration), `branches` (split coloring).

mod branches;
mod trace;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentId, Components};
use crate::error::{EngineError, EngineResult};
use crate::segment::{BeamSegment, SegmentId, SegmentPatch};

pub use branches::BranchCounter;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<BeamSegment>", into = "Vec<BeamSegment>")]
pub struct BeamGraph {
    slots: Vec<Option<BeamSegment>>,
    index: HashMap<SegmentId, usize>,
    outgoing: HashMap<ComponentId, Vec<usize>>,
    incoming: HashMap<ComponentId, Vec<usize>>,
}

impl BeamGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: &SegmentId) -> Option<&BeamSegment> {
        self.index.get(id).and_then(|&k| self.slot(k))
    }

    pub fn contains(&self, id: &SegmentId) -> bool {
        self.index.contains_key(id)
    }

    /// Live segments in insertion order.
    pub fn segments(&self) -> impl Iterator<Item = &BeamSegment> + '_ {
        self.slots.iter().flatten()
    }

    /// Insert a segment. An existing segment with the same id is replaced and returned.
    pub fn add_segment(&mut self, seg: BeamSegment) -> Option<BeamSegment> {
        let replaced = self.remove_segment(&seg.id);
        let k = self.slots.len();
        self.outgoing.entry(seg.source.clone()).or_default().push(k);
        if let Some(t) = &seg.target {
            self.incoming.entry(t.clone()).or_default().push(k);
        }
        self.index.insert(seg.id.clone(), k);
        self.slots.push(Some(seg));
        replaced
    }

    pub fn remove_segment(&mut self, id: &SegmentId) -> Option<BeamSegment> {
        let k = self.index.remove(id)?;
        let seg = self.slots.get_mut(k)?.take()?;
        detach(&mut self.outgoing, &seg.source, k);
        if let Some(t) = &seg.target {
            detach(&mut self.incoming, t, k);
        }
        Some(seg)
    }

    /// Remove every segment starting or ending at `id`.
    pub fn remove_all_for_component(&mut self, id: &ComponentId) -> Vec<BeamSegment> {
        let mut touching: Vec<usize> = self.out_slots(id).to_vec();
        touching.extend_from_slice(self.in_slots(id));
        touching.sort_unstable();
        touching.dedup();
        let ids: Vec<SegmentId> = touching
            .into_iter()
            .filter_map(|k| self.slot(k).map(|s| s.id.clone()))
            .collect();
        ids.iter().filter_map(|sid| self.remove_segment(sid)).collect()
    }

    pub fn outgoing_of<'a>(&'a self, id: &ComponentId) -> impl Iterator<Item = &'a BeamSegment> + 'a {
        let slots = self.out_slots(id);
        slots.iter().filter_map(move |&k| self.slot(k))
    }

    pub fn incoming_of<'a>(&'a self, id: &ComponentId) -> impl Iterator<Item = &'a BeamSegment> + 'a {
        let slots = self.in_slots(id);
        slots.iter().filter_map(move |&k| self.slot(k))
    }

    /// Apply a patch to one segment in place.
    pub fn update(&mut self, id: &SegmentId, patch: &SegmentPatch) -> EngineResult<()> {
        let k = *self
            .index
            .get(id)
            .ok_or_else(|| EngineError::UnknownSegment(id.clone()))?;
        if let Some(slot) = self.slots.get_mut(k) {
            if let Some(seg) = slot.as_ref() {
                *slot = Some(seg.apply(patch));
            }
        }
        Ok(())
    }

    /// Angle of the first beam entering `id`, if any.
    pub fn incoming_angle(&self, id: &ComponentId) -> Option<f64> {
        self.incoming_of(id).next().and_then(|s| s.angle)
    }

    /// Power of the first beam entering `id`, if any.
    pub fn incoming_power(&self, id: &ComponentId) -> Option<f64> {
        self.incoming_of(id).next().map(|s| s.power)
    }

    pub fn total_path_length(&self) -> f64 {
        self.segments().map(|s| s.path_length).sum()
    }

    pub fn invalid_segments(&self) -> Vec<&BeamSegment> {
        self.segments().filter(|s| !s.valid).collect()
    }

    /// Rewrite every path length from the Euclidean distance between its
    /// endpoints (component position, or `end_point` for boundary segments).
    /// Fixed-length segments keep their override; segments whose endpoints
    /// are unknown keep their current length.
    pub fn recalculate_path_lengths(&mut self, components: &Components) {
        for seg in self.slots.iter_mut().flatten() {
            if let Some(fixed) = seg.fixed_length {
                seg.path_length = fixed.max(0.0);
                continue;
            }
            let Some(src) = components.get(&seg.source) else {
                continue;
            };
            let end = match &seg.target {
                Some(t) => components.get(t).map(|c| c.position),
                None => seg.end_point,
            };
            if let Some(end) = end {
                seg.path_length = src.position.distance(end);
            }
        }
    }

    #[inline]
    fn slot(&self, k: usize) -> Option<&BeamSegment> {
        self.slots.get(k).and_then(Option::as_ref)
    }

    #[inline]
    fn out_slots(&self, id: &ComponentId) -> &[usize] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    fn in_slots(&self, id: &ComponentId) -> &[usize] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn detach(adj: &mut HashMap<ComponentId, Vec<usize>>, id: &ComponentId, k: usize) {
    if let Some(list) = adj.get_mut(id) {
        list.retain(|&x| x != k);
        if list.is_empty() {
            adj.remove(id);
        }
    }
}

impl From<Vec<BeamSegment>> for BeamGraph {
    fn from(segments: Vec<BeamSegment>) -> Self {
        let mut g = BeamGraph::new();
        for s in segments {
            g.add_segment(s);
        }
        g
    }
}

impl From<BeamGraph> for Vec<BeamSegment> {
    fn from(g: BeamGraph) -> Self {
        g.slots.into_iter().flatten().collect()
    }
}

impl FromIterator<BeamSegment> for BeamGraph {
    fn from_iter<I: IntoIterator<Item = BeamSegment>>(iter: I) -> Self {
        let mut g = BeamGraph::new();
        for s in iter {
            g.add_segment(s);
        }
        g
    }
}

/// Two graphs are equal when they hold the same live segments in the same order.
impl PartialEq for BeamGraph {
    fn eq(&self, other: &Self) -> bool {
        self.segments().eq(other.segments())
    }
}
