//! Whole-layout constraint queries used by the layout optimizer.
//!
//! Nothing here edits a layout; every function reads the current state and
//! reports what is out of bounds.

use serde::Serialize;

use crate::cfg::EngineCfg;
use crate::component::{Component, ComponentId, PathConstraint};
use crate::fold::determine_fold_count;
use crate::layout::Layout;
use crate::segment::SegmentId;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationKind {
    /// The constraint names a component that is not in the layout.
    MissingPartner,
    /// No traced beam path connects the pair in either direction.
    NoPath,
    LengthOutOfTolerance {
        actual: f64,
        target: f64,
        tolerance: f64,
    },
    /// Current orientations imply a different fold count than declared.
    FoldCountMismatch { expected: u8, actual: u8 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub owner: ComponentId,
    pub partner: ComponentId,
    #[serde(flatten)]
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub component_count: usize,
    pub segment_count: usize,
    pub total_path_length: f64,
    pub violations: Vec<Violation>,
    pub invalid_segments: Vec<SegmentId>,
}

impl LayoutReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.invalid_segments.is_empty()
    }
}

/// Length tolerance of a constraint: its own value when positive, otherwise
/// the engine default for the target.
pub fn constraint_tolerance(k: &PathConstraint, cfg: &EngineCfg) -> f64 {
    if k.tolerance > 0.0 {
        k.tolerance
    } else {
        cfg.length_tolerance(k.target_length)
    }
}

/// Realized optical path length between two components, following beams in
/// either direction up to `max_depth` segments.
pub fn realized_length(layout: &Layout, a: &ComponentId, b: &ComponentId, max_depth: usize) -> Option<f64> {
    layout
        .graph
        .path_length_within(a, b, max_depth)
        .or_else(|| layout.graph.path_length_within(b, a, max_depth))
}

pub fn violations(layout: &Layout, cfg: &EngineCfg) -> Vec<Violation> {
    let mut out = Vec::new();
    for owner in layout.components.values() {
        for k in &owner.constraints {
            check_constraint(layout, owner, k, cfg, &mut out);
        }
    }
    out
}

fn check_constraint(
    layout: &Layout,
    owner: &Component,
    k: &PathConstraint,
    cfg: &EngineCfg,
    out: &mut Vec<Violation>,
) {
    let violation = |kind: ViolationKind, message: String| Violation {
        owner: owner.id.clone(),
        partner: k.partner.clone(),
        kind,
        message,
    };
    let Some(partner) = layout.components.get(&k.partner) else {
        out.push(violation(
            ViolationKind::MissingPartner,
            format!("'{}' is constrained to unknown component '{}'", owner.id, k.partner),
        ));
        return;
    };

    let actual_folds = determine_fold_count(owner.angle, partner.angle);
    if actual_folds != k.fold_count {
        out.push(violation(
            ViolationKind::FoldCountMismatch {
                expected: k.fold_count,
                actual: actual_folds,
            },
            format!(
                "'{}'–'{}' is declared with {} folds but oriented for {}",
                owner.id, partner.id, k.fold_count, actual_folds
            ),
        ));
    }

    match realized_length(layout, &owner.id, &partner.id, cfg.max_trace_depth) {
        None => out.push(violation(
            ViolationKind::NoPath,
            format!("no beam path joins '{}' and '{}'", owner.id, partner.id),
        )),
        Some(actual) => {
            let tolerance = constraint_tolerance(k, cfg);
            if (actual - k.target_length).abs() > tolerance {
                out.push(violation(
                    ViolationKind::LengthOutOfTolerance {
                        actual,
                        target: k.target_length,
                        tolerance,
                    },
                    format!(
                        "'{}'–'{}' path is {:.1}mm, target {:.1}mm ± {:.1}mm",
                        owner.id, partner.id, actual, k.target_length, tolerance
                    ),
                ));
            }
        }
    }
}

pub fn report(layout: &Layout, cfg: &EngineCfg) -> LayoutReport {
    LayoutReport {
        component_count: layout.components.len(),
        segment_count: layout.graph.len(),
        total_path_length: layout.graph.total_path_length(),
        violations: violations(layout, cfg),
        invalid_segments: layout
            .graph
            .invalid_segments()
            .into_iter()
            .map(|s| s.id.clone())
            .collect(),
    }
}
