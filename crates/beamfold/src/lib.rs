//! Beam-path physics and fixed-path-length constraint engine.
//!
//! Components sit on a 2D workspace; beam segments join them into a directed
//! graph. The engine validates connections against reflection/transmission
//! rules, solves 0/1/2-fold mirror placements for a target optical path
//! length, and decides whether a drag or rotation keeps every constrained
//! pair consistent.
//!
//! Conventions
//! - Angles are degrees, normalized to `[0, 360)`; 0° points along +x and
//!   angles grow towards +y.
//! - Lengths are millimetres.
//! - Editing operations take `&Layout` and return a new `Layout` or an
//!   `EngineError`; the input is never mutated.

pub mod cfg;
pub mod checker;
pub mod component;
pub mod error;
pub mod fold;
pub mod geom;
pub mod graph;
pub mod layout;
pub mod physics;
pub mod propagate;
pub mod segment;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{EngineCfg, Workspace};
pub use error::{EngineError, EngineResult};
pub use layout::Layout;
pub use nalgebra::Vector2 as Vec2;

/// Common exports for callers driving the engine.
pub mod prelude {
    pub use crate::cfg::{EngineCfg, Workspace};
    pub use crate::checker::{report, violations, LayoutReport, Violation, ViolationKind};
    pub use crate::component::{
        Component, ComponentId, ComponentKind, ComponentPatch, FoldMode, PathConstraint, Port,
    };
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::fold::{calculate, determine_fold_count, Endpoint, FoldError, FoldGeometry};
    pub use crate::geom::{normalize_angle, Point2};
    pub use crate::graph::{BeamGraph, BranchCounter};
    pub use crate::layout::Layout;
    pub use crate::physics::{output_direction, snap_angle_to_valid, valid_angles, validate_connection};
    pub use crate::propagate::{EditOutcome, EditRequest, Motion};
    pub use crate::segment::{BeamSegment, SegmentId, SegmentIdGen};
    pub use nalgebra::Vector2 as Vec2;
}
