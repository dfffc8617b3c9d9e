//! lbfgs_backend — argmin L-BFGS under the common optimizer signature.
//!
//! Purpose
//! -------
//! Re-expose a third-party real-variable optimizer (argmin's L-BFGS) with
//! the same `(f, guess, niters, opts) → trajectory` shape as the SPSA
//! family, so it can be compared against SPSA runs and applied to complex
//! problems through the Real↔Complex bridge.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns an [`crate::optimization::spsa::Objective`]
//!   into an argmin problem with cost `−sign · f` and finite-difference
//!   gradients (central first, forward as fallback).
//! - [`builders`] construct L-BFGS with More–Thuente or Hager–Zhang line
//!   search and apply optional tolerances.
//! - [`run::run_lbfgs`] executes the solver with a
//!   [`run::TrajectoryRecorder`] observer and pads early stops.
//! - [`lbfgs`] / [`lbfgs_on_complex`] are the user-facing entry points.
//!
//! Invariants & assumptions
//! ------------------------
//! - A line search cannot proceed through non-finite objective values, so
//!   the first one stops the run. As with the SPSA engine this is not an
//!   error: the remaining trajectory columns are `NaN`.
//! - The returned trajectory always has exactly `niters` columns.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover option validation, sign handling of the
//!   adapter, builder wiring, the recorder, and end-to-end solves on
//!   quadratics in real and complex form.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{lbfgs, lbfgs_on_complex};
pub use self::traits::{LbfgsOptions, LineSearcher, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, Grad, Theta};

pub mod prelude {
    pub use super::api::{lbfgs, lbfgs_on_complex};
    pub use super::traits::{LbfgsOptions, LineSearcher, Tolerances};
}
