//! optimization — SPSA engine, Real↔Complex bridge, L-BFGS backend and
//! unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for real-valued objectives of real
//! or complex variables. Callers choose an algorithm, pass an objective (and
//! a metric for natural-gradient variants), a guess and an iteration budget,
//! and receive the full iterate trajectory.
//!
//! Key behaviors
//! -------------
//! - `spsa`: the stochastic engine (gain schedules, perturbation sampling,
//!   gradient and curvature estimators, PSD repair, update loop) and one
//!   entry point per variant.
//! - `bridge`: the exact linear map `ℂᴺ ↔ ℝ²ᴺ` and adapters that let any
//!   real-variable optimizer act on complex problems.
//! - `lbfgs_backend`: argmin's L-BFGS under the same calling convention,
//!   for deterministic comparison runs.
//! - `errors`: a single enum (`OptError`) with the alias `OptResult<T>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shape and configuration problems are reported as `OptError` before any
//!   objective evaluation; SPSA runs never fail afterwards.
//! - All trajectories have shape `N × Niters` with the iterate after
//!   iteration `k` in column `k − 1`.
//!
//! Conventions
//! -----------
//! - The optimization sign is `−1` to minimize and `+1` to maximize.
//! - Logging goes through `tracing`; this layer never installs a subscriber.
//!
//! Downstream usage
//! ----------------
//! - Front-ends typically import `optimization::prelude::*`, which forwards
//!   the submodule preludes and the core error types.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; end-to-end behavior is covered
//!   by `tests/integration_spsa_pipeline.rs`.

pub mod bridge;
pub mod errors;
pub mod lbfgs_backend;
pub mod spsa;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use complex_spsa::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::bridge::{fold, unfold};
    pub use super::errors::{OptError, OptResult};
    pub use super::lbfgs_backend::prelude::*;
    pub use super::spsa::prelude::*;
}
