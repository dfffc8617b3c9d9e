//! Perturbation sampler for simultaneous-perturbation estimates.
//!
//! Real variables use symmetric Bernoulli `±1` components; complex variables
//! use components drawn uniformly from `{1, i, -1, -i}`. Both have unit
//! modulus, which keeps the reciprocal in the gradient estimator bounded.
use crate::optimization::spsa::types::{Point, SpsaScalar};
use ndarray::Array1;
use rand::Rng;

/// Draw a fresh perturbation vector of length `n`.
///
/// Each component is sampled independently from the distribution of the
/// scalar domain `S` (see [`SpsaScalar::perturbation`]). No state is kept
/// between calls beyond the generator itself.
pub fn sample_perturbation<S: SpsaScalar, R: Rng + ?Sized>(rng: &mut R, n: usize) -> Point<S> {
    Array1::from_shape_fn(n, |_| S::perturbation(&mut *rng))
}
