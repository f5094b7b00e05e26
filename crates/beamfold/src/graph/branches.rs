//! Branch indices for color-coding beam splits.

use std::collections::HashSet;

use crate::component::{ComponentId, ComponentKind, Components};

use super::BeamGraph;

/// Caller-owned branch index counter.
#[derive(Clone, Debug, Default)]
pub struct BranchCounter {
    next: u32,
}

impl BranchCounter {
    pub fn next_branch(&mut self) -> u32 {
        let b = self.next;
        self.next += 1;
        b
    }
}

struct Frame {
    node: ComponentId,
    branch: u32,
    cursor: usize,
}

impl BeamGraph {
    /// Walk from every source component (in id order). Each root starts a new
    /// branch; at each node the first outgoing segment inherits the current
    /// branch and every further outgoing segment opens a new one, which its
    /// descendants inherit. Each segment is colored once per call.
    pub fn assign_branch_colors(&mut self, components: &Components, counter: &mut BranchCounter) {
        let assignments = self.branch_assignments(components, counter);
        for (k, b) in assignments {
            if let Some(Some(seg)) = self.slots.get_mut(k) {
                seg.branch = b;
            }
        }
    }

    fn branch_assignments(&self, components: &Components, counter: &mut BranchCounter) -> Vec<(usize, u32)> {
        let mut out = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        let roots = components
            .values()
            .filter(|c| matches!(c.kind, ComponentKind::Source { .. }))
            .filter(|c| !self.out_slots(&c.id).is_empty());
        for root in roots {
            let mut stack = vec![Frame {
                node: root.id.clone(),
                branch: counter.next_branch(),
                cursor: 0,
            }];
            while let Some(frame) = stack.last_mut() {
                let Some(&k) = self.out_slots(&frame.node).get(frame.cursor) else {
                    stack.pop();
                    continue;
                };
                let b = if frame.cursor == 0 {
                    frame.branch
                } else {
                    counter.next_branch()
                };
                frame.cursor += 1;
                if !seen.insert(k) {
                    continue;
                }
                out.push((k, b));
                if let Some(next) = self.slot(k).and_then(|s| s.target.clone()) {
                    stack.push(Frame {
                        node: next,
                        branch: b,
                        cursor: 0,
                    });
                }
            }
        }
        out
    }
}
