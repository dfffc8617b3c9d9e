//! spsa — simultaneous-perturbation stochastic approximation engine.
//!
//! Purpose
//! -------
//! Optimize real-valued, possibly noisy functions of `N` real or complex
//! variables using only function evaluations: two per iteration for the
//! gradient, four more for curvature-aware variants, independent of `N`.
//!
//! Key behaviors
//! -------------
//! - First-order variants (SPSA, CSPSA) step along the estimated gradient
//!   with a decaying gain `aᵏ`.
//! - Second-order variants (2-SPSA, CSPSA2) accumulate a running Hessian
//!   estimate and take regularized Newton steps.
//! - Natural-gradient variants (`*_QN`) accumulate the Hessian of a
//!   user-supplied metric (e.g. a fidelity) instead of the objective's.
//! - Every run records its iterates into an `N × Niters` trajectory.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective is only ever evaluated, never differentiated.
//! - Only shape and option problems are errors; numerical trouble (`NaN`,
//!   `Inf`) is carried into the trajectory.
//! - A fixed `SpsaOptions::seed` reproduces a run bit for bit.
//!
//! Conventions
//! -----------
//! - The optimization sign is `−1` for minimization and `+1` for
//!   maximization; updates are `z ← z + sign · step`.
//! - Complex variants estimate the conjugate (Wirtinger) derivative
//!   `∂f/∂z̄`.
//!
//! Downstream usage
//! ----------------
//! - Call one of the entry points in [`api`] (or the dispatchers
//!   [`optimize_complex`] / [`optimize_real`]) with an [`Objective`], an
//!   initial guess, an iteration budget and [`SpsaOptions`].
//! - Drive [`SpsaEngine`] directly for step-by-step control or to inspect
//!   the running curvature estimate.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its local contract; end-to-end
//!   convergence, reproducibility and bridge parity live in the crate's
//!   integration tests.

pub mod api;
pub mod engine;
pub mod estimators;
pub mod gains;
pub mod perturbation;
pub mod regularization;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{
    cspsa, cspsa_qn, cspsa_qn_scalar, cspsa2, optimize_complex, optimize_real, spsa,
    spsa_on_complex, spsa_qn, spsa_qn_on_complex, spsa_qn_scalar_on_complex, spsa2,
    spsa2_on_complex,
};
pub use self::engine::{FirstOrderRule, HessianRule, MetricRule, Phase, SpsaEngine, UpdateRule};
pub use self::gains::{DEFAULT_GAINS, GainSchedule, Gains};
pub use self::regularization::{DEFAULT_MODULUS_SHIFT, EIGEN_EPS, Preconditioner, Regularization};
pub use self::traits::{
    Algorithm, AlgorithmKind, Direction, Metric, MetricFn, Objective, ObjectiveFn, SpsaOptions,
    VariableDomain,
};
pub use self::types::{Curvature, Point, SpsaRng, SpsaScalar, Trajectory};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use complex_spsa::optimization::spsa::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::*;
    pub use super::gains::{DEFAULT_GAINS, Gains};
    pub use super::traits::{
        Algorithm, Direction, Metric, MetricFn, Objective, ObjectiveFn, SpsaOptions,
    };
    pub use super::types::{Point, Trajectory};
}
