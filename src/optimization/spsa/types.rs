//! spsa::types — shared numeric aliases and the scalar-domain abstraction.
//!
//! Purpose
//! -------
//! Centralize the vector, matrix and random-generator types used by the
//! SPSA engine, and define [`SpsaScalar`], the trait that lets every
//! estimator be written once for both real (`f64`) and complex
//! (`Complex64`) variables.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for iterates, trajectories and curvature
//!   matrices (`Point`, `Trajectory`, `Curvature`).
//! - Fix the pseudo-random generator (`SpsaRng`) so that seeded runs are
//!   bit-reproducible across platforms.
//! - Describe, per scalar domain, the perturbation distribution and the
//!   conjugate reciprocal used by the gradient estimator.
//!
//! Invariants & assumptions
//! ------------------------
//! - Perturbation components always have unit modulus, so
//!   `conj(Δ)⁻¹ = Δ / |Δ|² = Δ` holds exactly in both domains.
//! - Trajectories are stored column-wise: column `k - 1` is the iterate
//!   after iteration `k`.
//!
//! Conventions
//! -----------
//! - `SpsaScalar::RealField` is always `f64`; gains and objective values are
//!   real regardless of the variable domain.
//!
//! Testing notes
//! -------------
//! - The sampling distributions are tested in `perturbation`; the aliases
//!   are exercised by every other module.
use nalgebra::ComplexField;
use ndarray::{Array1, Array2, LinalgScalar, ScalarOperand};
use num_complex::Complex64;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;

/// A point in parameter space (`N` real or complex variables).
pub type Point<S> = Array1<S>;

/// Optimization history, shape `(N, Niters)`; column `k - 1` is the iterate
/// after iteration `k`.
pub type Trajectory<S> = Array2<S>;

/// Dense `N × N` curvature (Hessian or metric) estimate.
pub type Curvature<S> = Array2<S>;

/// Pseudo-random generator driving all perturbations.
pub type SpsaRng = ChaCha8Rng;

/// The fourth roots of unity `{1, i, -1, -i}`.
pub const FOURTH_ROOTS_OF_UNITY: [Complex64; 4] = [
    Complex64::new(1.0, 0.0),
    Complex64::new(0.0, 1.0),
    Complex64::new(-1.0, 0.0),
    Complex64::new(0.0, -1.0),
];

/// Scalar domain of the optimization variables.
///
/// Implemented for `f64` (SPSA family) and `Complex64` (CSPSA family). The
/// trait only adds what differs between the two domains; arithmetic,
/// conjugation and linear algebra come from `ndarray` and `nalgebra`.
pub trait SpsaScalar:
    ComplexField<RealField = f64> + LinalgScalar + ScalarOperand + Debug + Send + Sync
{
    /// Draws one perturbation component from the domain's distribution.
    fn perturbation<R: Rng + ?Sized>(rng: &mut R) -> Self;

    /// Embeds a real quantity (a gain, a step factor) into the domain.
    fn lift(x: f64) -> Self {
        <Self as ComplexField>::from_real(x)
    }

    /// `1 / conj(x)`.
    fn conj_recip(self) -> Self {
        Self::one() / self.conjugate()
    }

    /// Whether both real and imaginary parts are finite.
    fn is_finite_value(self) -> bool {
        self.real().is_finite() && self.imaginary().is_finite()
    }
}

impl SpsaScalar for f64 {
    fn perturbation<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
    }
}

impl SpsaScalar for Complex64 {
    fn perturbation<R: Rng + ?Sized>(rng: &mut R) -> Self {
        FOURTH_ROOTS_OF_UNITY[rng.gen_range(0..4)]
    }
}
