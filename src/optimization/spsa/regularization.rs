//! spsa::regularization — positive-definite repair and curvature solves.
//!
//! Purpose
//! -------
//! Turn the running stochastic Hessian/metric estimate `H` into a
//! numerically safe positive-definite operator and solve `H_reg · x = g`
//! for the second-order step. Raw SPSA curvature estimates are Hermitian
//! but frequently indefinite; using them directly can produce ascent steps.
//!
//! Key behaviors
//! -------------
//! - [`Regularization`] selects how eigenvalues are repaired:
//!   - `MatrixModulus { shift }`: `λ → |λ| + shift`, i.e. `(H Hᴴ)^{1/2} + shift·I`.
//!   - `EigenClip { floor }`: `λ → max(λ, floor)`.
//! - [`Preconditioner`] chooses between the full matrix and its scalar
//!   reduction `(tr H / N)·I`.
//! - [`curvature_step`] combines repair and solve, falling back to a zero
//!   step when `H` is zero or the solve fails, and to a `NaN`
//!   step when `H` or `g` contain non-finite entries.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are square `N × N` Hermitian (or real symmetric) matrices; only
//!   the lower triangle is read by the eigendecomposition.
//! - Eigenvalues with magnitude at most [`EIGEN_EPS`] times the largest
//!   magnitude are rounding noise and are set to zero before repair. The
//!   threshold is relative, so an objective's overall scale never decides
//!   whether `H` carries curvature information.
//!
//! Conventions
//! -----------
//! - Matrices are stored as `ndarray` arrays everywhere else in the crate;
//!   they are copied into `nalgebra::DMatrix` only for decomposition and
//!   solving.
//!
//! Testing notes
//! -------------
//! - Unit tests cover both repair rules on indefinite input, the scalar
//!   preconditioner, zero and non-finite fallbacks, and a complex Hermitian
//!   solve.
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::types::{Curvature, Point, SpsaScalar},
};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{Array1, Array2};
use std::str::FromStr;
use tracing::debug;

/// Eigenvalues with `|λ| ≤ EIGEN_EPS · max|λ|` count as zero.
pub const EIGEN_EPS: f64 = 1e-12;

/// Default eigenvalue shift of [`Regularization::MatrixModulus`].
///
/// Early running estimates are built from a handful of rank-2 samples and
/// have eigenvalues that pass through zero; the shift bounds the step along
/// those directions by `|g| / shift`.
pub const DEFAULT_MODULUS_SHIFT: f64 = 1.0;

/// Sweep cap for the Hermitian eigendecomposition.
const MAX_EIGEN_SWEEPS: usize = 1_000;

/// Eigenvalue repair applied to the running curvature estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Regularization {
    /// `λ → |λ| + shift`.
    MatrixModulus { shift: f64 },
    /// `λ → max(λ, floor)`.
    EigenClip { floor: f64 },
}

impl Default for Regularization {
    fn default() -> Self {
        Regularization::MatrixModulus { shift: DEFAULT_MODULUS_SHIFT }
    }
}

impl Regularization {
    /// Reject non-finite or negative constants.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidRegularization`] naming the offending value.
    pub fn validate(&self) -> OptResult<()> {
        let value = match *self {
            Regularization::MatrixModulus { shift } => shift,
            Regularization::EigenClip { floor } => floor,
        };
        if !value.is_finite() {
            return Err(OptError::InvalidRegularization {
                value,
                reason: "Regularization constant must be finite.",
            });
        }
        if value < 0.0 {
            return Err(OptError::InvalidRegularization {
                value,
                reason: "Regularization constant must be non-negative.",
            });
        }
        Ok(())
    }

    /// Repaired eigenvalue.
    pub fn repair(&self, lambda: f64) -> f64 {
        match *self {
            Regularization::MatrixModulus { shift } => lambda.abs() + shift,
            Regularization::EigenClip { floor } => lambda.max(floor),
        }
    }
}

/// Shape of the curvature operator used in the second-order step.
///
/// Parsing is case-insensitive: `"full"` or `"scalar"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preconditioner {
    /// Use the full `N × N` estimate.
    #[default]
    Full,
    /// Replace the estimate by `(tr H / N)·I`.
    Scalar,
}

impl FromStr for Preconditioner {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Preconditioner::Full),
            "scalar" => Ok(Preconditioner::Scalar),
            _ => Err(OptError::InvalidPreconditioner {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'Full' or 'Scalar'.",
            }),
        }
    }
}

/// `(tr H / N)·I`, using the real part of the trace.
pub fn scalar_curvature<S: SpsaScalar>(h: &Curvature<S>) -> Curvature<S> {
    let n = h.nrows();
    if n == 0 {
        return h.clone();
    }
    let trace: f64 = h.diag().iter().map(|d| d.real()).sum();
    Array2::from_diag_elem(n, S::lift(trace / n as f64))
}

/// regularize — repair the eigenvalues of a Hermitian curvature estimate.
///
/// Parameters
/// ----------
/// - `h`: Hermitian `N × N` estimate with finite entries.
/// - `rule`: eigenvalue repair rule.
///
/// Returns
/// -------
/// `Some(U · diag(repair(λ)) · Uᴴ)`, or `None` when `H` is zero or the
/// eigendecomposition does not converge. Eigenvalues below
/// `EIGEN_EPS · max|λ|` are repaired as exact zeros.
pub fn regularize<S: SpsaScalar>(h: &Curvature<S>, rule: Regularization) -> Option<Curvature<S>> {
    let m = to_dmatrix(h);
    let mut eigen = SymmetricEigen::try_new(m, f64::EPSILON, MAX_EIGEN_SWEEPS)?;
    let scale = eigen.eigenvalues.iter().fold(0.0_f64, |acc, lambda| acc.max(lambda.abs()));
    if scale == 0.0 {
        return None;
    }
    let cutoff = EIGEN_EPS * scale;
    eigen.eigenvalues.iter_mut().for_each(|lambda| {
        let cleaned = if lambda.abs() <= cutoff { 0.0 } else { *lambda };
        *lambda = rule.repair(cleaned);
    });
    Some(from_dmatrix(&eigen.recompose()))
}

/// Solve `h · x = g` by Cholesky, falling back to LU.
pub fn solve_curvature<S: SpsaScalar>(h: &Curvature<S>, g: &Point<S>) -> Option<Point<S>> {
    let m = to_dmatrix(h);
    let rhs = DVector::from_iterator(g.len(), g.iter().copied());
    let x = match m.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => m.lu().solve(&rhs)?,
    };
    Some(Array1::from_iter(x.iter().copied()))
}

/// curvature_step — preconditioned step `H_reg⁻¹ g` for second-order updates.
///
/// Purpose
/// -------
/// Apply the preconditioner and eigenvalue repair to the running estimate
/// and solve for the step direction. The caller multiplies the result by
/// the optimization sign.
///
/// Returns
/// -------
/// - The solved step in the normal case.
/// - A zero vector if `H` is zero or cannot be repaired or
///   solved; ill-conditioned curvature never surfaces as an error.
/// - A `NaN` vector if `H` or `g` contain non-finite entries, so that the
///   divergence stays visible in the trajectory.
pub fn curvature_step<S: SpsaScalar>(
    h: &Curvature<S>, g: &Point<S>, rule: Regularization, preconditioner: Preconditioner,
) -> Point<S> {
    let n = g.len();
    if !h.iter().chain(g.iter()).all(|x| x.is_finite_value()) {
        return Array1::from_elem(n, S::lift(f64::NAN));
    }
    let h_eff = match preconditioner {
        Preconditioner::Full => h.clone(),
        Preconditioner::Scalar => scalar_curvature(h),
    };
    match regularize(&h_eff, rule).and_then(|h_reg| solve_curvature(&h_reg, g)) {
        Some(step) => step,
        None => {
            debug!(dim = n, "curvature estimate unusable; taking zero step");
            Array1::zeros(n)
        }
    }
}

// ---- Helper methods ----

/// Copy an `ndarray` matrix into a column-major `DMatrix`.
fn to_dmatrix<S: SpsaScalar>(h: &Array2<S>) -> DMatrix<S> {
    DMatrix::from_fn(h.nrows(), h.ncols(), |i, j| h[[i, j]])
}

fn from_dmatrix<S: SpsaScalar>(m: &DMatrix<S>) -> Array2<S> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
