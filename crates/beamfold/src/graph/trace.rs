//! Path enumeration over the beam graph.
//!
//! Depth-first with an explicit stack. A node is marked while it is on the
//! current path and unmarked on backtrack, so a path never passes through the
//! same component twice, while two branches of a split may still terminate at
//! the same downstream component.

use std::collections::HashSet;

use crate::cfg::DEFAULT_MAX_DEPTH;
use crate::component::ComponentId;
use crate::segment::SegmentId;

use super::BeamGraph;

struct Frame<'a> {
    node: &'a ComponentId,
    cursor: usize,
}

impl BeamGraph {
    /// All segment-id paths starting at `source`.
    ///
    /// A path ends at a component without outgoing segments, at a boundary
    /// segment, or when it reaches `max_depth` segments (the truncated path is
    /// reported). Continuations that would re-enter a component already on the
    /// current path are dropped.
    pub fn trace_from_source(&self, source: &ComponentId, max_depth: usize) -> Vec<Vec<SegmentId>> {
        self.trace_slots(source, max_depth)
            .into_iter()
            .map(|p| {
                p.into_iter()
                    .filter_map(|k| self.slot(k).map(|s| s.id.clone()))
                    .collect()
            })
            .collect()
    }

    /// Length of the primary path from `source` to `target`: the first traced
    /// path whose last segment ends at `target`. `Some(0.0)` when the ids are
    /// equal. Traces up to `DEFAULT_MAX_DEPTH` segments.
    pub fn calculate_path_length_between(
        &self,
        source: &ComponentId,
        target: &ComponentId,
    ) -> Option<f64> {
        self.path_length_within(source, target, DEFAULT_MAX_DEPTH)
    }

    /// `calculate_path_length_between` with an explicit depth cap.
    pub fn path_length_within(
        &self,
        source: &ComponentId,
        target: &ComponentId,
        max_depth: usize,
    ) -> Option<f64> {
        if source == target {
            return Some(0.0);
        }
        self.trace_slots(source, max_depth)
            .into_iter()
            .find(|p| {
                p.last()
                    .and_then(|&k| self.slot(k))
                    .is_some_and(|s| s.target.as_ref() == Some(target))
            })
            .map(|p| p.iter().filter_map(|&k| self.slot(k)).map(|s| s.path_length).sum())
    }

    /// Sum of path lengths along a list of segment ids; `None` if any id is unknown.
    pub fn path_length(&self, path: &[SegmentId]) -> Option<f64> {
        path.iter()
            .map(|id| self.get(id).map(|s| s.path_length))
            .sum()
    }

    pub(super) fn trace_slots<'a>(&'a self, source: &'a ComponentId, max_depth: usize) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        if max_depth == 0 || self.out_slots(source).is_empty() {
            return paths;
        }
        let mut on_path: HashSet<&ComponentId> = HashSet::new();
        on_path.insert(source);
        // Invariant: path.len() == stack.len() - 1.
        let mut path: Vec<usize> = Vec::new();
        let mut stack = vec![Frame {
            node: source,
            cursor: 0,
        }];
        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let Some(&k) = self.out_slots(node).get(frame.cursor) else {
                on_path.remove(node);
                stack.pop();
                path.pop();
                continue;
            };
            frame.cursor += 1;
            let Some(seg) = self.slot(k) else {
                continue;
            };
            let Some(next) = seg.target.as_ref() else {
                paths.push(extended(&path, k));
                continue;
            };
            if on_path.contains(next) {
                continue;
            }
            if self.out_slots(next).is_empty() || path.len() + 1 >= max_depth {
                paths.push(extended(&path, k));
                continue;
            }
            path.push(k);
            on_path.insert(next);
            stack.push(Frame {
                node: next,
                cursor: 0,
            });
        }
        paths
    }
}

fn extended(path: &[usize], k: usize) -> Vec<usize> {
    let mut p = Vec::with_capacity(path.len() + 1);
    p.extend_from_slice(path);
    p.push(k);
    p
}
