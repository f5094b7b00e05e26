//! Fold-geometry solver for fixed optical path lengths.
//!
//! Purpose
//! - Classify how many reflections (0, 1 or 2) a beam needs between two
//!   oriented endpoints, and place the reflection points so that the total
//!   path equals a target length.
//!
//! Conventions
//! - The first endpoint emits along its own angle.
//! - 1-fold: the second endpoint is reached by walking back from it along
//!   `angle + 180°`; the fold point is where both rays meet.
//! - 2-fold: the beam arrives at the second endpoint travelling along its
//!   angle; both outer legs are equal and the middle leg is perpendicular to
//!   the first ray (U-shape).
//!
//! Results are transient: callers recompute them on every relevant move.

mod solver;
mod types;

pub use solver::{
    calculate, calculate_with_count, determine_fold_count, solve_one_fold, solve_two_fold,
    solve_zero_fold,
};
pub use types::{Endpoint, FoldError, FoldGeometry, SubSegment};

#[cfg(test)]
mod tests;
