//! Adapter that exposes a real [`Objective`] as an `argmin` problem.
//!
//! Argmin always minimizes, so the cost handed to it is
//! `c(x) = −sign · f(x)`: `f` itself for minimization and `−f` for
//! maximization. Gradients are finite differences of that cost closure,
//! so no further sign handling is needed.
use std::cell::RefCell;

use crate::optimization::{
    lbfgs_backend::{
        types::{Cost, Grad, Theta},
        validation::{validate_grad, validate_value},
    },
    spsa::traits::Objective,
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a real objective to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `−sign · f(x)` after checking `f(x)` is
///   finite.
/// - `Gradient::gradient` returns a finite-difference gradient of the cost,
///   central first and forward as fallback.
#[derive(Debug)]
pub struct ArgMinAdapter<'a, O: ?Sized> {
    pub f: &'a O,
    pub sign: f64,
}

impl<'a, O: Objective<f64> + ?Sized> ArgMinAdapter<'a, O> {
    /// Construct an adapter over `f` for the optimization `sign`
    /// (`−1` minimize, `+1` maximize).
    pub fn new(f: &'a O, sign: f64) -> Self {
        Self { f, sign }
    }
}

impl<'a, O: Objective<f64> + ?Sized> CostFunction for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(x) = −sign · f(x)`.
    ///
    /// # Errors
    /// Returns `NonFiniteCost` if `f(x)` is not finite.
    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(x);
        validate_value(value)?;
        Ok(-self.sign * value)
    }
}

impl<'a, O: Objective<f64> + ?Sized> Gradient for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Gradient = Grad;

    /// Finite-difference gradient of the cost at `x`.
    ///
    /// - Try *central* differences first.
    /// - If a cost evaluation failed (captured via `closure_err`) or the
    ///   result does not validate, retry with *forward* differences.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and the closure returns `NaN`.
    ///
    /// # Errors
    /// - Any error raised by cost evaluations during the forward pass.
    /// - Validation errors for wrong dimension or non-finite entries.
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = x.len();
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |x: &Theta| -> f64 {
            match self.cost(x) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let fd_grad = x.central_diff(&cost_func);
        if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
            return run_fd_diff(x, &cost_func, &closure_err);
        }
        Ok(fd_grad)
    }
}

/// Forward-difference gradient of `func` at `x`, with error capture.
///
/// Clears `closure_err`, runs `forward_diff`, returns the captured error if
/// any, and otherwise validates the gradient.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    x: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = x.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, x.len())?;
    Ok(fd_grad)
}
