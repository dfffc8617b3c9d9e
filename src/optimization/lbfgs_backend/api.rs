//! High-level L-BFGS entry points with the common optimizer signature.
//!
//! [`lbfgs`] selects an L-BFGS solver with either Hager–Zhang or
//! More–Thuente line search, wraps the objective in an `ArgMinAdapter`,
//! and delegates the run to `run_lbfgs`. [`lbfgs_on_complex`] applies the
//! same solver to a complex objective through the Real↔Complex bridge.
use crate::optimization::{
    bridge::{RealView, fold_trajectory, unfold},
    errors::OptResult,
    lbfgs_backend::{
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LbfgsOptions, LineSearcher},
    },
    spsa::{
        traits::Objective,
        types::{Point, Trajectory},
        validation::validate_guess,
    },
};
use ndarray::Array2;
use num_complex::Complex64;

/// Optimize a real objective with L-BFGS for at most `niters` iterations.
///
/// # Behavior
/// - Validates `opts` and the guess shape against `f`.
/// - Wraps `f` in an `ArgMinAdapter` minimizing `−sign · f`.
/// - Builds the solver selected by `opts.line_searcher` and runs it,
///   recording every iterate.
///
/// # Returns
/// An `N × niters` trajectory. Early termination repeats the last iterate;
/// a non-finite objective value ends the run with `NaN` columns from that
/// point on. `niters == 0` returns an `N × 0` array without evaluating `f`.
///
/// # Errors
/// - `EmptyGuess` / `GuessDimMismatch` for bad guesses.
/// - Option errors from [`LbfgsOptions::validate`].
/// - Runtime errors from `run_lbfgs` other than non-finite costs (e.g.
///   line-search failures).
///
/// # Example
/// ```no_run
/// use complex_spsa::optimization::{lbfgs_backend::{lbfgs, LbfgsOptions}, spsa::ObjectiveFn};
/// use ndarray::{array, Array1};
///
/// let f = ObjectiveFn::new(|x: &Array1<f64>| (x[0] - 3.0).powi(2));
/// let trajectory = lbfgs(&f, array![0.0], 20, &LbfgsOptions::default())?;
/// assert_eq!(trajectory.ncols(), 20);
/// # Ok::<(), complex_spsa::optimization::errors::OptError>(())
/// ```
pub fn lbfgs<O: Objective<f64> + ?Sized>(
    f: &O, guess: Point<f64>, niters: usize, opts: &LbfgsOptions,
) -> OptResult<Trajectory<f64>> {
    opts.validate()?;
    validate_guess::<f64, _>(f, guess.len())?;
    if niters == 0 {
        return Ok(Array2::zeros((guess.len(), 0)));
    }
    let problem = ArgMinAdapter::new(f, opts.direction.sign());
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(guess, niters, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(guess, niters, opts, problem, solver)
        }
    }
}

/// [`lbfgs`] on a complex objective, optimizing over `[Re z; Im z]`.
///
/// # Errors
/// Same as [`lbfgs`].
pub fn lbfgs_on_complex<O: Objective<Complex64> + ?Sized>(
    f: &O, guess: Point<Complex64>, niters: usize, opts: &LbfgsOptions,
) -> OptResult<Trajectory<Complex64>> {
    let view = RealView::new(f);
    let real = lbfgs(&view, unfold(&guess), niters, opts)?;
    fold_trajectory(&real)
}
