//! tools — helpers for building stochastic objectives.
//!
//! Purpose
//! -------
//! Simulate finite-shot measurements of a probability so that test and
//! demo objectives show the noise an experiment would have.
//!
//! Key behaviors
//! -------------
//! - [`simulate_experiment`] returns `refvalue` clamped to `[0, 1]` for an
//!   infinite number of shots, or the frequency `k / n` of a
//!   `Binomial(n, p)` draw otherwise.
//!
//! Invariants & assumptions
//! ------------------------
//! - The returned frequency is always a multiple of `1 / n` in `[0, 1]`.
//! - The caller owns the generator; a seeded generator reproduces results.
//!
//! Testing notes
//! -------------
//! - Unit tests cover clamping, the degenerate probabilities, rejection of
//!   zero shots and the sample mean of many simulated frequencies.
use crate::optimization::errors::{OptError, OptResult};
use rand::Rng;
use statrs::distribution::{Binomial, DiscreteCDF};

/// Simulate measuring an event of probability `refvalue` with
/// `measurements` shots.
///
/// Parameters
/// ----------
/// - `refvalue`: exact probability; values outside `[0, 1]` are clamped.
/// - `measurements`: number of shots, or `None` for the exact value.
/// - `rng`: generator driving the binomial draw.
///
/// Returns
/// -------
/// The observed frequency `k / n`, or the clamped probability itself when
/// `measurements` is `None`.
///
/// Errors
/// ------
/// - [`OptError::InvalidMeasurements`] for `Some(0)`.
/// - [`OptError::InvalidDistribution`] if `refvalue` is `NaN` and shots are
///   requested.
pub fn simulate_experiment<R: Rng + ?Sized>(
    refvalue: f64, measurements: Option<u64>, rng: &mut R,
) -> OptResult<f64> {
    let p = refvalue.clamp(0.0, 1.0);
    let n = match measurements {
        None => return Ok(p),
        Some(0) => return Err(OptError::InvalidMeasurements { measurements: 0 }),
        Some(n) => n,
    };
    // Degenerate distributions.
    if p == 0.0 || p == 1.0 {
        return Ok(p);
    }
    let binomial =
        Binomial::new(p, n).map_err(|e| OptError::InvalidDistribution { text: e.to_string() })?;
    let u: f64 = rng.gen();
    let hits = binomial.inverse_cdf(u);
    Ok(hits as f64 / n as f64)
}
