//! Error taxonomy for engine operations.
//!
//! All failures are ordinary return values. None of them are transient: the
//! engine is deterministic, so retrying with the same inputs gives the same error.

use thiserror::Error;

use crate::component::ComponentId;
use crate::segment::SegmentId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Target not on the expected ray, wrong optical axis, or terminal endpoint.
    #[error("invalid connection: {0}")]
    ConnectionInvalid(String),
    /// Fold preconditions unmet, degenerate rays, or negative segment length.
    #[error("geometry infeasible: {0}")]
    GeometryInfeasible(String),
    #[error("path length {actual:.1}mm deviates from target {target:.1}mm (tolerance {tolerance:.1}mm)")]
    LengthMismatch {
        actual: f64,
        target: f64,
        tolerance: f64,
    },
    /// Both endpoints fixed, or a dynamic-fold recompute failed.
    #[error("move blocked: {0}")]
    ConstraintBlocked(String),
    #[error("unknown component '{0}'")]
    UnknownComponent(ComponentId),
    #[error("unknown segment '{0}'")]
    UnknownSegment(SegmentId),
}

pub type EngineResult<T> = Result<T, EngineError>;
