//! lbfgs_backend::types — numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the vector and solver types used by the L-BFGS backend so
//! the remaining modules stay agnostic to Argmin generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for real parameter vectors, gradients and
//!   scalar costs (`Theta`, `Grad`, `Cost`).
//! - Expose pre-wired L-BFGS solver aliases for both line searches.
//! - Name the Argmin iteration state shared by the runner and the
//!   trajectory recorder (`LbfgsState`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The backend only ever sees real variables; complex problems are
//!   unfolded by the bridge before reaching it.
//! - `Cost` is the value Argmin minimizes, i.e. `−sign · f(θ)`.
//!
//! Testing notes
//! -------------
//! - This module only defines aliases and constants; it is exercised by the
//!   builder, adapter and runner tests.
use argmin::{
    core::IterState,
    solver::{
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::LBFGS,
    },
};
use ndarray::Array1;

/// Real parameter vector handed to Argmin.
pub type Theta = Array1<f64>;

/// Gradient of the cost, same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Scalar cost minimized by Argmin.
pub type Cost = f64;

/// Argmin iteration state for gradient-based solvers over `Theta`.
pub type LbfgsState = IterState<Theta, Grad, (), (), (), Cost>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to the backend's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to the backend's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
