//! spsa::api — one entry point per optimizer variant plus dispatchers.
//!
//! Purpose
//! -------
//! Present the SPSA family under a single calling convention
//! `(f, [metric,] guess, niters, opts) → N × niters trajectory`, choosing
//! the update rule, the scalar domain and (for `*_on_complex`) the
//! Real↔Complex bridge for the caller.
//!
//! Key behaviors
//! -------------
//! - Real variables: [`spsa`], [`spsa2`], [`spsa_qn`].
//! - Complex variables: [`cspsa`], [`cspsa2`], [`cspsa_qn`],
//!   [`cspsa_qn_scalar`].
//! - Complex problems solved as `2N` real variables: [`spsa_on_complex`],
//!   [`spsa2_on_complex`], [`spsa_qn_on_complex`],
//!   [`spsa_qn_scalar_on_complex`].
//! - [`optimize_complex`] / [`optimize_real`] dispatch on an [`Algorithm`]
//!   value, including `LBFGS_on_complex`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shape and option errors are returned before the objective is
//!   evaluated; afterwards runs never fail.
//! - `*_scalar` variants force [`Preconditioner::Scalar`] regardless of
//!   `opts.preconditioner`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover dispatcher routing and its errors, the scalar
//!   override, and seeded reproducibility. Convergence and bridge parity
//!   are exercised in `tests/integration_spsa_pipeline.rs`.
use crate::optimization::{
    bridge::{RealMetricView, RealView, fold_trajectory, unfold},
    errors::{OptError, OptResult},
    lbfgs_backend::{LbfgsOptions, lbfgs_on_complex},
    spsa::{
        engine::{FirstOrderRule, HessianRule, MetricRule, SpsaEngine, UpdateRule},
        regularization::Preconditioner,
        traits::{Algorithm, AlgorithmKind, Metric, Objective, SpsaOptions},
        types::{Point, SpsaScalar, Trajectory},
        validation::{validate_guess, validate_metric},
    },
};
use num_complex::Complex64;
use tracing::info_span;

fn run_rule<S: SpsaScalar, U: UpdateRule<S>>(
    rule: U, guess: Point<S>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<S>> {
    Ok(SpsaEngine::new(rule, guess, niters, opts)?.run())
}

fn run_natural<S, O, M>(
    f: &O, metric: &M, guess: Point<S>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<S>>
where
    S: SpsaScalar,
    O: Objective<S> + ?Sized,
    M: Metric<S> + ?Sized,
{
    validate_guess::<S, _>(f, guess.len())?;
    validate_metric::<S, _>(metric, guess.len())?;
    run_rule(MetricRule::new(f, metric), guess, niters, opts)
}

fn scalar_options(opts: &SpsaOptions) -> SpsaOptions {
    opts.clone().with_preconditioner(Preconditioner::Scalar)
}

// ---- Real variables ----

/// First-order SPSA over real variables.
///
/// # Errors
/// `EmptyGuess`, `GuessDimMismatch` or an option error.
pub fn spsa<O: Objective<f64> + ?Sized>(
    f: &O, guess: Point<f64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<f64>> {
    run_rule(FirstOrderRule::new(f), guess, niters, opts)
}

/// Second-order SPSA (2-SPSA) over real variables.
///
/// # Errors
/// Same as [`spsa`].
pub fn spsa2<O: Objective<f64> + ?Sized>(
    f: &O, guess: Point<f64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<f64>> {
    run_rule(HessianRule::new(f), guess, niters, opts)
}

/// Natural-gradient (quantum-natural) SPSA over real variables.
///
/// # Errors
/// Same as [`spsa`], plus `MetricDimMismatch`.
pub fn spsa_qn<O, M>(
    f: &O, metric: &M, guess: Point<f64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<f64>>
where
    O: Objective<f64> + ?Sized,
    M: Metric<f64> + ?Sized,
{
    run_natural(f, metric, guess, niters, opts)
}

// ---- Complex variables ----

/// First-order complex SPSA.
///
/// # Errors
/// Same as [`spsa`].
pub fn cspsa<O: Objective<Complex64> + ?Sized>(
    f: &O, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>> {
    run_rule(FirstOrderRule::new(f), guess, niters, opts)
}

/// Second-order complex SPSA.
///
/// # Errors
/// Same as [`spsa`].
pub fn cspsa2<O: Objective<Complex64> + ?Sized>(
    f: &O, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>> {
    run_rule(HessianRule::new(f), guess, niters, opts)
}

/// Natural-gradient complex SPSA.
///
/// # Errors
/// Same as [`spsa_qn`].
pub fn cspsa_qn<O, M>(
    f: &O, metric: &M, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>>
where
    O: Objective<Complex64> + ?Sized,
    M: Metric<Complex64> + ?Sized,
{
    run_natural(f, metric, guess, niters, opts)
}

/// [`cspsa_qn`] with the curvature replaced by `(tr H / N)·I`.
///
/// # Errors
/// Same as [`spsa_qn`].
pub fn cspsa_qn_scalar<O, M>(
    f: &O, metric: &M, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>>
where
    O: Objective<Complex64> + ?Sized,
    M: Metric<Complex64> + ?Sized,
{
    run_natural(f, metric, guess, niters, &scalar_options(opts))
}

// ---- Complex problems through the real bridge ----

/// [`spsa`] applied to `[Re z; Im z]`.
///
/// # Errors
/// Same as [`spsa`].
pub fn spsa_on_complex<O: Objective<Complex64> + ?Sized>(
    f: &O, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>> {
    let real = spsa(&RealView::new(f), unfold(&guess), niters, opts)?;
    fold_trajectory(&real)
}

/// [`spsa2`] applied to `[Re z; Im z]`.
///
/// # Errors
/// Same as [`spsa`].
pub fn spsa2_on_complex<O: Objective<Complex64> + ?Sized>(
    f: &O, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>> {
    let real = spsa2(&RealView::new(f), unfold(&guess), niters, opts)?;
    fold_trajectory(&real)
}

/// [`spsa_qn`] applied to `[Re z; Im z]`.
///
/// # Errors
/// Same as [`spsa_qn`].
pub fn spsa_qn_on_complex<O, M>(
    f: &O, metric: &M, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>>
where
    O: Objective<Complex64> + ?Sized,
    M: Metric<Complex64> + ?Sized,
{
    let real =
        spsa_qn(&RealView::new(f), &RealMetricView::new(metric), unfold(&guess), niters, opts)?;
    fold_trajectory(&real)
}

/// [`spsa_qn_on_complex`] with the scalar preconditioner.
///
/// # Errors
/// Same as [`spsa_qn`].
pub fn spsa_qn_scalar_on_complex<O, M>(
    f: &O, metric: &M, guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>>
where
    O: Objective<Complex64> + ?Sized,
    M: Metric<Complex64> + ?Sized,
{
    spsa_qn_on_complex(f, metric, guess, niters, &scalar_options(opts))
}

// ---- Dispatch ----

/// Run any complex-domain variant by name.
///
/// `metric` is required by the natural-gradient variants and ignored by
/// the others. `LBFGS_on_complex` runs the argmin backend with default
/// [`LbfgsOptions`] and the direction from `opts`.
///
/// # Errors
/// - [`OptError::InvalidAlgorithm`] for real-variable variants.
/// - [`OptError::MissingMetric`] when a natural variant gets no metric.
/// - Any error of the selected entry point.
pub fn optimize_complex(
    algorithm: Algorithm, f: &dyn Objective<Complex64>, metric: Option<&dyn Metric<Complex64>>,
    guess: Point<Complex64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<Complex64>> {
    let span = info_span!("optimize", algorithm = algorithm.name());
    let _guard = span.enter();
    let require = || metric.ok_or(OptError::MissingMetric { algorithm: algorithm.name() });
    match algorithm {
        Algorithm::Cspsa => cspsa(f, guess, niters, opts),
        Algorithm::Cspsa2 => cspsa2(f, guess, niters, opts),
        Algorithm::CspsaQn => cspsa_qn(f, require()?, guess, niters, opts),
        Algorithm::CspsaQnScalar => cspsa_qn_scalar(f, require()?, guess, niters, opts),
        Algorithm::SpsaOnComplex => spsa_on_complex(f, guess, niters, opts),
        Algorithm::Spsa2OnComplex => spsa2_on_complex(f, guess, niters, opts),
        Algorithm::SpsaQnOnComplex => spsa_qn_on_complex(f, require()?, guess, niters, opts),
        Algorithm::SpsaQnScalarOnComplex => {
            spsa_qn_scalar_on_complex(f, require()?, guess, niters, opts)
        }
        Algorithm::LbfgsOnComplex => {
            let lbfgs_opts = LbfgsOptions { direction: opts.direction, ..LbfgsOptions::default() };
            lbfgs_on_complex(f, guess, niters, &lbfgs_opts)
        }
        Algorithm::Spsa | Algorithm::Spsa2 | Algorithm::SpsaQn => Err(OptError::InvalidAlgorithm {
            name: algorithm.name().to_string(),
            reason: "Real-variable algorithm; use optimize_real.",
        }),
    }
}

/// Run a real-domain variant by name.
///
/// # Errors
/// - [`OptError::InvalidAlgorithm`] for complex-domain variants.
/// - [`OptError::MissingMetric`] for `SPSA_QN` without a metric.
/// - Any error of the selected entry point.
pub fn optimize_real(
    algorithm: Algorithm, f: &dyn Objective<f64>, metric: Option<&dyn Metric<f64>>,
    guess: Point<f64>, niters: usize, opts: &SpsaOptions,
) -> OptResult<Trajectory<f64>> {
    let span = info_span!("optimize", algorithm = algorithm.name());
    let _guard = span.enter();
    match algorithm {
        Algorithm::Spsa => spsa(f, guess, niters, opts),
        Algorithm::Spsa2 => spsa2(f, guess, niters, opts),
        Algorithm::SpsaQn => {
            let metric = metric.ok_or(OptError::MissingMetric { algorithm: algorithm.name() })?;
            spsa_qn(f, metric, guess, niters, opts)
        }
        _ if algorithm.kind() == AlgorithmKind::Lbfgs => Err(OptError::InvalidAlgorithm {
            name: algorithm.name().to_string(),
            reason: "Use lbfgs_backend::lbfgs for real-variable L-BFGS runs.",
        }),
        _ => Err(OptError::InvalidAlgorithm {
            name: algorithm.name().to_string(),
            reason: "Complex-variable algorithm; use optimize_complex.",
        }),
    }
}
