//! Segment geometry refresh after components move.

use std::collections::BTreeSet;

use crate::cfg::{EngineCfg, EPS_LEN};
use crate::component::{ComponentId, Components};
use crate::error::EngineResult;
use crate::geom::{angle_to_direction, direction_to_angle, Point2};
use crate::graph::BeamGraph;
use crate::physics::{check_connection, emitted_angle};
use crate::segment::{BeamSegment, SegmentPatch};

use super::boundary::cast_to_boundary;

/// Rebuild segment geometry around the `changed` components.
///
/// - Segments touching a changed component get a new direction and angle.
/// - Those segments, and every segment leaving a component whose incoming
///   beam may have turned, are re-validated; boundary segments among them are
///   re-cast against the workspace.
/// - All path lengths are recalculated (fixed lengths kept).
pub fn refresh_segments(
    components: &Components,
    graph: &BeamGraph,
    changed: &BTreeSet<ComponentId>,
    cfg: &EngineCfg,
) -> EngineResult<BeamGraph> {
    let touches = |s: &BeamSegment| {
        changed.contains(&s.source) || s.target.as_ref().is_some_and(|t| changed.contains(t))
    };
    let mut affected: BTreeSet<&ComponentId> = changed.iter().collect();
    affected.extend(graph.segments().filter(|s| touches(s)).filter_map(|s| s.target.as_ref()));

    let mut next = graph.clone();
    for s in graph.segments().filter(|s| touches(s)) {
        if let Some(patch) = direction_patch(components, s) {
            next.update(&s.id, &patch)?;
        }
    }

    for s in graph
        .segments()
        .filter(|s| touches(s) || affected.contains(&s.source))
    {
        let Some(src) = components.get(&s.source) else {
            continue;
        };
        let incoming = next.incoming_angle(&s.source);
        let patch = match &s.target {
            Some(t) => {
                let Some(dst) = components.get(t) else {
                    continue;
                };
                SegmentPatch {
                    validity: Some(match check_connection(src, dst, s.source_port, incoming, cfg) {
                        Ok(_) => (true, None),
                        Err(e) => (false, Some(e.to_string())),
                    }),
                    ..SegmentPatch::default()
                }
            }
            None => {
                let hit = emitted_angle(src, incoming, s.source_port).and_then(|a| {
                    cast_to_boundary(src.position, a, &cfg.workspace, cfg.boundary_min_dist_mm)
                        .map(|(end, len)| (a, end, len))
                });
                match hit {
                    Some((a, end, len)) => SegmentPatch {
                        direction: Some(angle_to_direction(a).into()),
                        angle: Some(a),
                        end_point: Some(Some(end)),
                        path_length: Some(len),
                        validity: Some((true, None)),
                        ..SegmentPatch::default()
                    },
                    None => SegmentPatch {
                        validity: Some((
                            false,
                            Some(format!("beam from '{}' does not reach the workspace boundary", src.id)),
                        )),
                        ..SegmentPatch::default()
                    },
                }
            }
        };
        next.update(&s.id, &patch)?;
    }

    next.recalculate_path_lengths(components);
    Ok(next)
}

fn direction_patch(components: &Components, s: &BeamSegment) -> Option<SegmentPatch> {
    let src = components.get(&s.source)?;
    let dst = components.get(s.target.as_ref()?)?;
    let delta = dst.position.to_vec() - src.position.to_vec();
    let len = delta.norm();
    if len < EPS_LEN {
        return None;
    }
    Some(SegmentPatch {
        direction: Some(Point2::from(delta / len)),
        angle: Some(direction_to_angle(delta)),
        ..SegmentPatch::default()
    })
}
