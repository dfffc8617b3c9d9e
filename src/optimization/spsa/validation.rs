//! Shape checks run before any objective evaluation.
//!
//! - [`validate_guess`]: the initial guess is non-empty and matches the
//!   objective's declared dimension.
//! - [`validate_metric`]: the metric's declared dimension matches the guess.
//!
//! These are the only failures the SPSA engine surfaces; everything that
//! goes wrong numerically afterwards is encoded in the trajectory.
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::traits::{Metric, Objective},
};

/// Validate the initial guess length against the objective.
///
/// # Errors
/// - [`OptError::EmptyGuess`] if `len == 0`.
/// - [`OptError::GuessDimMismatch`] if the objective declares a different
///   dimension.
pub fn validate_guess<S, O: Objective<S> + ?Sized>(objective: &O, len: usize) -> OptResult<()> {
    if len == 0 {
        return Err(OptError::EmptyGuess);
    }
    match objective.dim() {
        Some(expected) if expected != len => {
            Err(OptError::GuessDimMismatch { expected, found: len })
        }
        _ => Ok(()),
    }
}

/// Validate the initial guess length against the metric.
///
/// # Errors
/// Returns [`OptError::MetricDimMismatch`] if the metric declares a
/// different dimension.
pub fn validate_metric<S, M: Metric<S> + ?Sized>(metric: &M, len: usize) -> OptResult<()> {
    match metric.dim() {
        Some(expected) if expected != len => {
            Err(OptError::MetricDimMismatch { expected, found: len })
        }
        _ => Ok(()),
    }
}
