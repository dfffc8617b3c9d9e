//! Execution helper that runs an `argmin` solver on an adapted objective and
//! returns the full iterate trajectory.
//!
//! Every accepted iterate is captured by a [`TrajectoryRecorder`] observer.
//! When the solver stops before the budget (tolerance reached), the last
//! iterate is repeated so the trajectory always has `niters` columns. A
//! non-finite cost also stops the run, but is not an error: the iterates
//! accepted so far are kept and the remaining columns are `NaN`.
use std::sync::{Arc, Mutex};

use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgs_backend::{
        adapter::ArgMinAdapter,
        traits::LbfgsOptions,
        types::{LbfgsState, Theta},
    },
    spsa::{traits::Objective, types::Trajectory},
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{
    Error, Executor, KV, State,
    observers::{Observe, ObserverMode},
};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;
use ndarray::Array2;
use tracing::{debug, info_span};

/// Argmin observer that appends the current parameter vector after every
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRecorder {
    iterates: Arc<Mutex<Vec<Theta>>>,
}

impl TrajectoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded iterates; stays valid after the
    /// recorder has been moved into an executor.
    pub fn handle(&self) -> Arc<Mutex<Vec<Theta>>> {
        Arc::clone(&self.iterates)
    }
}

impl Observe<LbfgsState> for TrajectoryRecorder {
    fn observe_iter(&mut self, state: &LbfgsState, _kv: &KV) -> Result<(), Error> {
        if let Some(param) = state.get_param() {
            let mut iterates = self.iterates.lock().map_err(|_| OptError::BackendError {
                text: "trajectory recorder lock poisoned".to_string(),
            })?;
            iterates.push(param.clone());
        }
        Ok(())
    }
}

/// Run an `argmin` solver for at most `niters` iterations from `theta0`.
///
/// Wires up the adapted objective, the solver, the trajectory recorder and,
/// with the `obs_slog` feature and `opts.verbose`, a terminal slog observer.
///
/// # Returns
/// A `dim × niters` trajectory; column `k - 1` is the iterate after
/// iteration `k`. After a normal early stop the remaining columns repeat the
/// last iterate (or `theta0` if the solver never iterated); after a
/// non-finite cost they are `NaN`.
///
/// # Errors
/// - Propagates any other `argmin` runtime error (line-search failure,
///   observer failure) via `From<argmin::core::Error>`.
/// - `OptError::BackendError` if the recorder lock is poisoned.
pub fn run_lbfgs<'a, O, S>(
    theta0: Theta, niters: usize, opts: &LbfgsOptions, problem: ArgMinAdapter<'a, O>, solver: S,
) -> OptResult<Trajectory<f64>>
where
    O: Objective<f64> + ?Sized,
    S: argmin::core::Solver<ArgMinAdapter<'a, O>, LbfgsState> + Send + 'static,
{
    let span = info_span!(
        "lbfgs",
        dim = theta0.len(),
        niters,
        line_searcher = ?opts.line_searcher,
    );
    let _guard = span.enter();

    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let recorder = TrajectoryRecorder::new();
    let iterates = recorder.handle();
    let start = theta0.clone();
    let optimizer = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(niters as u64))
        .add_observer(recorder, ObserverMode::Always);
    #[cfg(feature = "obs_slog")]
    let optimizer = if opts.verbose {
        optimizer.add_observer(argmin_observer_slog::SlogLogger::term_noblock(), ObserverMode::Always)
    } else {
        optimizer
    };

    let padding = match optimizer.run() {
        Ok(result) => {
            let state = result.state();
            debug!(
                iterations = state.get_iter(),
                status = ?state.get_termination_status(),
                best_cost = state.get_best_cost(),
                "l-bfgs finished"
            );
            Padding::LastIterate
        }
        Err(err) => match OptError::from(err) {
            OptError::NonFiniteCost { value } => {
                debug!(value, "l-bfgs stopped on a non-finite cost");
                Padding::NotANumber
            }
            other => return Err(other),
        },
    };

    let recorded = iterates.lock().map_err(|_| OptError::BackendError {
        text: "trajectory recorder lock poisoned".to_string(),
    })?;
    Ok(assemble_trajectory(&theta0, &recorded, niters, padding))
}

// ---- Helper Methods ----

/// How columns after the last recorded iterate are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Padding {
    LastIterate,
    NotANumber,
}

fn assemble_trajectory(
    theta0: &Theta, recorded: &[Theta], niters: usize, padding: Padding,
) -> Trajectory<f64> {
    let mut trajectory = Array2::zeros((theta0.len(), niters));
    let mut last = theta0;
    for (k, mut column) in trajectory.columns_mut().into_iter().enumerate() {
        match (recorded.get(k), padding) {
            (Some(x), _) => {
                last = x;
                column.assign(last);
            }
            (None, Padding::LastIterate) => column.assign(last),
            (None, Padding::NotANumber) => column.fill(f64::NAN),
        }
    }
    trajectory
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<O>(theta0: &Theta, problem: &ArgMinAdapter<'_, O>) -> OptResult<()>
where
    O: Objective<f64> + ?Sized,
{
    let c0 = problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    tracing::info!(cost = c0, grad_norm = ?g0n, "l-bfgs initial state");
    Ok(())
}
