//! validate → resolve → apply.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::cfg::{EngineCfg, EPS_ANGLE};
use crate::component::{Component, ComponentId, ComponentPatch, FoldMode, PathConstraint};
use crate::error::{EngineError, EngineResult};
use crate::fold::{calculate, Endpoint, FoldGeometry};
use crate::geom::{angular_difference, rotate_about};
use crate::layout::Layout;

use super::refresh::refresh_segments;
use super::{EditRequest, Motion};

/// Move-time state of a constrained pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PairState {
    BothFixed,
    Synchronized,
    DynamicFold,
}

pub fn classify_pair(a: &Component, b: &Component) -> PairState {
    match (a.is_fixed, b.is_fixed) {
        (true, true) => PairState::BothFixed,
        (false, false) => PairState::Synchronized,
        _ => PairState::DynamicFold,
    }
}

fn blocked(msg: String) -> EngineError {
    EngineError::ConstraintBlocked(msg)
}

/// Which end of a constrained pair emits the beam, read from the current graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    OwnerFirst,
    PartnerFirst,
    /// No traced path joins the pair; the solver tries both orientations.
    Unknown,
}

/// A constraint involving the edited component. `owner` carries the
/// constraint; either side may be the edited component.
pub(super) struct Link<'a> {
    owner: &'a Component,
    partner: &'a Component,
    constraint: &'a PathConstraint,
    state: PairState,
    flow: Flow,
}

impl Link<'_> {
    fn same_pair(&self, other: &Link<'_>) -> bool {
        (self.owner.id == other.owner.id && self.partner.id == other.partner.id)
            || (self.owner.id == other.partner.id && self.partner.id == other.owner.id)
    }

    fn label(&self) -> String {
        format!("'{}'–'{}'", self.owner.id, self.partner.id)
    }
}

pub(super) struct Checked<'a> {
    edited: &'a Component,
    motion: Motion,
    links: Vec<Link<'a>>,
}

pub(super) fn validate<'a>(
    layout: &'a Layout,
    req: &EditRequest,
    cfg: &EngineCfg,
) -> EngineResult<Checked<'a>> {
    let edited = layout.component(&req.component)?;
    let links = links_of(layout, edited, cfg.max_trace_depth)?;
    if let Some(link) = links.iter().find(|l| l.state == PairState::BothFixed) {
        return Err(blocked(format!("both ends of {} are fixed", link.label())));
    }
    match req.motion {
        Motion::Translate(_) if edited.is_fixed => {
            return Err(blocked(format!("'{}' is fixed in place", edited.id)));
        }
        Motion::Rotate(_) if edited.is_angle_fixed => {
            return Err(blocked(format!("'{}' has a fixed angle", edited.id)));
        }
        _ => {}
    }
    Ok(Checked {
        edited,
        motion: req.motion,
        links,
    })
}

/// Constraints owned by `edited` plus constraints of others naming it as
/// partner. When a `Foldable` and an `Auto` constraint link the same pair,
/// only the `Foldable` one is kept.
fn links_of<'a>(layout: &'a Layout, edited: &'a Component, max_depth: usize) -> EngineResult<Vec<Link<'a>>> {
    let owned = edited.constraints.iter().map(|k| (edited, k));
    let pointing = layout
        .components
        .values()
        .filter(|c| c.id != edited.id)
        .flat_map(|c| {
            c.constraints
                .iter()
                .filter(|k| k.partner == edited.id)
                .map(move |k| (c, k))
        });
    let mut links: Vec<Link<'a>> = Vec::new();
    for (owner, k) in owned.chain(pointing) {
        let partner = layout.component(&k.partner)?;
        if partner.id == owner.id {
            continue;
        }
        let link = Link {
            owner,
            partner,
            constraint: k,
            state: classify_pair(owner, partner),
            flow: flow_between(layout, &owner.id, &partner.id, max_depth),
        };
        match links.iter_mut().find(|l| l.same_pair(&link)) {
            Some(existing) => {
                if existing.constraint.mode == FoldMode::Auto && k.mode == FoldMode::Foldable {
                    *existing = link;
                }
            }
            None => links.push(link),
        }
    }
    Ok(links)
}

fn flow_between(layout: &Layout, owner: &ComponentId, partner: &ComponentId, max_depth: usize) -> Flow {
    let g = &layout.graph;
    if g.path_length_within(owner, partner, max_depth).is_some() {
        Flow::OwnerFirst
    } else if g.path_length_within(partner, owner, max_depth).is_some() {
        Flow::PartnerFirst
    } else {
        Flow::Unknown
    }
}

/// Component patches to write, keyed by id.
#[derive(Default)]
pub(super) struct Plan {
    patches: BTreeMap<ComponentId, ComponentPatch>,
}

impl Plan {
    fn set(&mut self, id: &ComponentId, patch: ComponentPatch) {
        let merged = match self.patches.remove(id) {
            Some(prev) => prev.merge(patch),
            None => patch,
        };
        self.patches.insert(id.clone(), merged);
    }

    fn pose_of(&self, c: &Component) -> Endpoint {
        match self.patches.get(&c.id) {
            Some(p) => Endpoint::from(&c.apply(p)),
            None => Endpoint::from(c),
        }
    }
}

pub(super) fn resolve(layout: &Layout, checked: &Checked<'_>, cfg: &EngineCfg) -> EngineResult<Plan> {
    let mut plan = Plan::default();
    let edited = checked.edited;
    let own = match checked.motion {
        Motion::Translate(p) => ComponentPatch::position(p),
        Motion::Rotate(a) => ComponentPatch::angle(a),
    };
    plan.set(&edited.id, own);
    for link in &checked.links {
        debug!(pair = %link.label(), state = ?link.state, "resolving constraint");
        match link.state {
            PairState::BothFixed => {
                return Err(blocked(format!("both ends of {} are fixed", link.label())));
            }
            PairState::Synchronized => resolve_synchronized(layout, checked, link, &mut plan, cfg)?,
            PairState::DynamicFold => resolve_dynamic(layout, link, &mut plan, cfg)?,
        }
    }
    Ok(plan)
}

/// Partner and (for `Foldable`) mirrors follow the edited component rigidly.
fn resolve_synchronized(
    layout: &Layout,
    checked: &Checked<'_>,
    link: &Link<'_>,
    plan: &mut Plan,
    cfg: &EngineCfg,
) -> EngineResult<()> {
    let edited = checked.edited;
    let other = if link.owner.id == edited.id {
        link.partner
    } else {
        link.owner
    };
    let mut members = vec![other];
    if link.constraint.mode == FoldMode::Foldable {
        for id in &link.constraint.mirrors {
            let m = layout.component(id)?;
            if m.is_fixed {
                return Err(blocked(format!("mirror '{}' of {} is fixed", m.id, link.label())));
            }
            members.push(m);
        }
    }

    match checked.motion {
        Motion::Translate(to) => {
            let delta = to.to_vec() - edited.position.to_vec();
            for m in members {
                plan.set(&m.id, ComponentPatch::position(m.position.offset(delta)));
            }
        }
        Motion::Rotate(angle) => {
            let delta = angle - edited.angle;
            let turns = angular_difference(delta, 0.0) > EPS_ANGLE;
            for (i, m) in members.iter().enumerate() {
                // Members past the partner are mirrors; a mirror that keeps its
                // angle while its position turns breaks the folded path.
                if i > 0 && m.is_angle_fixed && turns {
                    return Err(blocked(format!(
                        "mirror '{}' of {} has a fixed angle",
                        m.id,
                        link.label()
                    )));
                }
                let mut patch = ComponentPatch::position(rotate_about(m.position, edited.position, delta));
                if !m.is_angle_fixed {
                    patch.angle = Some(m.angle + delta);
                }
                plan.set(&m.id, patch);
            }
            solve_pair(link, plan, cfg)?;
        }
    }
    Ok(())
}

/// Folds solved in beam order, plus whether that order runs partner → owner.
struct Solved {
    geom: FoldGeometry,
    reversed: bool,
}

/// Solve the pair's folds for the planned poses, emitter first. The fold count
/// implied by the new orientations must still match the constraint.
fn solve_pair(link: &Link<'_>, plan: &Plan, cfg: &EngineCfg) -> EngineResult<Solved> {
    let k = link.constraint;
    let owner = plan.pose_of(link.owner);
    let partner = plan.pose_of(link.partner);
    let solve = |reversed: bool| {
        let geom = if reversed {
            calculate(partner, owner, k.target_length, cfg)
        } else {
            calculate(owner, partner, k.target_length, cfg)
        };
        Solved { geom, reversed }
    };
    let solved = match link.flow {
        Flow::OwnerFirst => solve(false),
        Flow::PartnerFirst => solve(true),
        Flow::Unknown => {
            let forward = solve(false);
            if forward.geom.valid {
                forward
            } else {
                let backward = solve(true);
                if backward.geom.valid {
                    backward
                } else {
                    forward
                }
            }
        }
    };
    if solved.geom.fold_count != k.fold_count {
        return Err(EngineError::GeometryInfeasible(format!(
            "{} would need {} folds but is constrained to {}",
            link.label(),
            solved.geom.fold_count,
            k.fold_count
        )));
    }
    if let Some(e) = &solved.geom.error {
        return Err(blocked(format!("fold recompute for {} failed: {e}", link.label())));
    }
    Ok(solved)
}

/// Re-solve the folds against the fixed endpoint and re-place the mirrors.
fn resolve_dynamic(layout: &Layout, link: &Link<'_>, plan: &mut Plan, cfg: &EngineCfg) -> EngineResult<()> {
    let k = link.constraint;
    let Solved { geom, reversed } = solve_pair(link, plan, cfg)?;
    if k.mode == FoldMode::Auto {
        return Ok(());
    }
    if k.mirrors.len() != geom.folds.len() {
        return Err(EngineError::GeometryInfeasible(format!(
            "{} lists {} mirrors for {} folds",
            link.label(),
            k.mirrors.len(),
            geom.folds.len()
        )));
    }
    // Mirrors are listed owner → partner; folds come out in beam order.
    let mirrors: Vec<&ComponentId> = if reversed {
        k.mirrors.iter().rev().collect()
    } else {
        k.mirrors.iter().collect()
    };
    let angles = geom.mirror_angles();
    let mut seen = BTreeSet::new();
    for ((id, fold), angle) in mirrors.into_iter().zip(&geom.folds).zip(angles) {
        if !seen.insert(id) {
            return Err(EngineError::GeometryInfeasible(format!(
                "mirror '{id}' appears twice in {}",
                link.label()
            )));
        }
        let m = layout.component(id)?;
        if m.is_fixed && m.position.distance(*fold) > cfg.one_fold_agreement_mm {
            return Err(blocked(format!("mirror '{}' is fixed", m.id)));
        }
        let mut patch = if m.is_fixed {
            ComponentPatch::default()
        } else {
            ComponentPatch::position(*fold)
        };
        if let Some(a) = angle {
            if m.is_angle_fixed {
                let off = angular_difference(a, m.angle).min(angular_difference(a + 180.0, m.angle));
                if off > cfg.angle_tol_deg {
                    return Err(blocked(format!("mirror '{}' cannot rotate to {a:.1}°", m.id)));
                }
            } else {
                patch.angle = Some(a);
            }
        }
        if !patch.is_empty() {
            plan.set(&m.id, patch);
        }
    }
    Ok(())
}

pub(super) fn apply(layout: &Layout, plan: Plan, cfg: &EngineCfg) -> EngineResult<Layout> {
    let mut components = layout.components.clone();
    let mut changed = BTreeSet::new();
    for (id, patch) in plan.patches {
        let c = components
            .get_mut(&id)
            .ok_or_else(|| EngineError::UnknownComponent(id.clone()))?;
        *c = c.apply(&patch);
        changed.insert(id);
    }
    let graph = refresh_segments(&components, &layout.graph, &changed, cfg)?;
    Ok(Layout { components, graph })
}
