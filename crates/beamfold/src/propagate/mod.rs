//! Move-time constraint propagation.
//!
//! Purpose
//! - Decide how a dragged or rotated component and its constrained partners
//!   must relocate, and either return a new consistent `Layout` or reject.
//!
//! Pair states (from the endpoints' `is_fixed` flags)
//! - `BothFixed`: the edit is rejected.
//! - `Synchronized`: partner (and, for `Foldable` constraints, the listed
//!   mirrors) follow the edited component rigidly.
//! - `DynamicFold`: the fold solver is re-run against the fixed endpoint; fold
//!   points become the new mirror poses, or the edit is rejected.
//!
//! Pipeline
//! - `validate` (lookups, fixed flags, pair classification) → `resolve`
//!   (component patches) → `apply` (patched components, refreshed segments).
//!   Each stage returns a `Result`; nothing is written until all succeed.
//!
//! Constraints propagate one level: partners of partners are not moved.

mod boundary;
mod pipeline;
mod refresh;

use std::collections::BTreeSet;

use tracing::debug;

use crate::cfg::EngineCfg;
use crate::component::ComponentId;
use crate::error::{EngineError, EngineResult};
use crate::geom::Point2;
use crate::layout::Layout;

pub use boundary::cast_to_boundary;
pub use pipeline::{classify_pair, PairState};
pub use refresh::refresh_segments;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    /// Move to an absolute position.
    Translate(Point2),
    /// Rotate to an absolute angle (degrees).
    Rotate(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditRequest {
    pub component: ComponentId,
    pub motion: Motion,
}

impl EditRequest {
    pub fn translate(component: impl Into<String>, to: Point2) -> Self {
        Self {
            component: ComponentId(component.into()),
            motion: Motion::Translate(to),
        }
    }

    pub fn rotate(component: impl Into<String>, angle: f64) -> Self {
        Self {
            component: ComponentId(component.into()),
            motion: Motion::Rotate(angle),
        }
    }
}

/// Result of an edit for callers that always want a layout back: the new
/// layout on success, the unchanged prior layout plus the reason otherwise.
#[derive(Clone, Debug)]
pub struct EditOutcome {
    pub layout: Layout,
    pub error: Option<EngineError>,
}

impl EditOutcome {
    pub fn accepted(&self) -> bool {
        self.error.is_none()
    }
}

impl Layout {
    pub fn try_edit(&self, req: &EditRequest, cfg: &EngineCfg) -> EngineResult<Layout> {
        let checked = pipeline::validate(self, req, cfg)?;
        let plan = pipeline::resolve(self, &checked, cfg)?;
        let next = pipeline::apply(self, plan, cfg)?;
        debug!(component = %req.component, motion = ?req.motion, "edit applied");
        Ok(next)
    }

    pub fn try_move(&self, id: &ComponentId, to: Point2, cfg: &EngineCfg) -> EngineResult<Layout> {
        self.try_edit(
            &EditRequest {
                component: id.clone(),
                motion: Motion::Translate(to),
            },
            cfg,
        )
    }

    pub fn try_rotate(&self, id: &ComponentId, angle: f64, cfg: &EngineCfg) -> EngineResult<Layout> {
        self.try_edit(
            &EditRequest {
                component: id.clone(),
                motion: Motion::Rotate(angle),
            },
            cfg,
        )
    }

    pub fn edit_or_keep(&self, req: &EditRequest, cfg: &EngineCfg) -> EditOutcome {
        match self.try_edit(req, cfg) {
            Ok(layout) => EditOutcome {
                layout,
                error: None,
            },
            Err(e) => {
                debug!(component = %req.component, error = %e, "edit rejected");
                EditOutcome {
                    layout: self.clone(),
                    error: Some(e),
                }
            }
        }
    }

    /// Recompute every segment's geometry, validity and length from scratch.
    pub fn refreshed(&self, cfg: &EngineCfg) -> EngineResult<Layout> {
        let all: BTreeSet<ComponentId> = self.components.keys().cloned().collect();
        Ok(Layout {
            components: self.components.clone(),
            graph: refresh_segments(&self.components, &self.graph, &all, cfg)?,
        })
    }
}
