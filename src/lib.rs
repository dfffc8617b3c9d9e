//! complex_spsa — stochastic SPSA optimizers for functions of complex
//! variables, with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the optimizers to Python via the `_complex_spsa` extension
//! module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`optimization`, `tools`) as the public
//!   crate surface.
//! - With `python-bindings`, define the `optimize` and `simulate_experiment`
//!   Python functions and the `#[pymodule]` initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, argument conversion and error mapping.
//! - Exceptions raised by Python objectives or metrics are re-raised after
//!   the run, in preference to any trajectory.
//!
//! Conventions
//! -----------
//! - Complex-domain algorithms return `complex128` arrays of shape
//!   `(N, niters)`; real-domain algorithms (`SPSA`, `SPSA2`, `SPSA_QN`)
//!   return `float64` arrays.
//! - Errors from core Rust code are `OptError` values converted to
//!   `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on `optimization` directly and can ignore the
//!   PyO3 items guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   integration tests under `tests/`.

pub mod optimization;
pub mod tools;
pub mod utils;

#[cfg(feature = "python-bindings")]
use num_complex::Complex64;

#[cfg(feature = "python-bindings")]
use numpy::IntoPyArray;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use rand::SeedableRng;

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::spsa::{
        api::{optimize_complex, optimize_real},
        traits::{Algorithm, Metric, VariableDomain},
        types::SpsaRng,
    },
    utils::{
        PyMetric, PyObjective, build_spsa_options, extract_complex_array, extract_f64_array,
    },
};

/// optimize — run any optimizer variant on a Python objective.
///
/// Parameters
/// ----------
/// - `algorithm`: variant name, case-insensitive (e.g. `"CSPSA"`,
///   `"SPSA_QN_on_complex"`, `"LBFGS_on_complex"`).
/// - `f`: callable `f(z) -> float`.
/// - `guess`: 1-D array-like initial point (complex, or real for real-domain
///   variants).
/// - `niters`: number of iterations (trajectory columns).
/// - `metric`: callable `m(z1, z2) -> float`; required by `*_QN*` variants.
/// - `a`, `b`, `A`, `s`, `t`: gain overrides; missing entries use the
///   defaults.
/// - `sign`: `-1` minimizes, `+1` maximizes.
/// - `ncalibrate`, `hessian_delay`, `initial_iteration`,
///   `constant_learning_rate`, `seed`: run options.
///
/// Returns
/// -------
/// The `(N, niters)` trajectory as a numpy array.
///
/// Errors
/// ------
/// - `ValueError` for unknown algorithms, shape problems or invalid
///   options.
/// - Any exception raised by `f` or `metric`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        algorithm,
        f,
        guess,
        niters,
        metric = None,
        a = None,
        b = None,
        A = None,
        s = None,
        t = None,
        sign = -1.0,
        ncalibrate = 0,
        hessian_delay = 0,
        initial_iteration = 1,
        constant_learning_rate = false,
        seed = None,
    ),
    text_signature = "(algorithm, f, guess, niters, metric=None, a=None, b=None, A=None, \
                      s=None, t=None, sign=-1, ncalibrate=0, hessian_delay=0, \
                      initial_iteration=1, constant_learning_rate=False, seed=None)"
)]
#[allow(non_snake_case, clippy::too_many_arguments)]
pub fn optimize<'py>(
    py: Python<'py>, algorithm: &str, f: &Bound<'py, PyAny>, guess: &Bound<'py, PyAny>,
    niters: usize, metric: Option<&Bound<'py, PyAny>>, a: Option<f64>, b: Option<f64>,
    A: Option<f64>, s: Option<f64>, t: Option<f64>, sign: f64, ncalibrate: usize,
    hessian_delay: usize, initial_iteration: usize, constant_learning_rate: bool,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyAny>> {
    let algorithm: Algorithm = algorithm.parse()?;
    let opts = build_spsa_options(
        a,
        b,
        A,
        s,
        t,
        sign,
        ncalibrate,
        hessian_delay,
        initial_iteration,
        constant_learning_rate,
        seed,
    )?;
    let objective = PyObjective::new(f.clone());
    let py_metric = metric.map(|m| PyMetric::new(m.clone()));

    let result = match algorithm.domain() {
        VariableDomain::Real => {
            let arr = extract_f64_array(py, guess)?;
            let guess = arr.as_array().to_owned();
            let metric_ref = py_metric.as_ref().map(|m| m as &dyn Metric<f64>);
            optimize_real(algorithm, &objective, metric_ref, guess, niters, &opts)
                .map(|traj| traj.into_pyarray(py).into_any())
        }
        VariableDomain::Complex | VariableDomain::ComplexAsReal => {
            let guess = extract_complex_array(guess)?;
            let metric_ref = py_metric.as_ref().map(|m| m as &dyn Metric<Complex64>);
            optimize_complex(algorithm, &objective, metric_ref, guess, niters, &opts)
                .map(|traj| traj.into_pyarray(py).into_any())
        }
    };

    if let Some(err) = objective.take_error() {
        return Err(err);
    }
    if let Some(err) = py_metric.as_ref().and_then(|m| m.take_error()) {
        return Err(err);
    }
    Ok(result?)
}

/// simulate_experiment — finite-shot estimate of a probability.
///
/// Returns `refvalue` clamped to `[0, 1]` when `measurements` is `None`,
/// otherwise the frequency of a binomial draw with `measurements` shots.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "simulate_experiment")]
#[pyo3(signature = (refvalue, measurements = None, seed = None))]
pub fn py_simulate_experiment(
    refvalue: f64, measurements: Option<u64>, seed: Option<u64>,
) -> PyResult<f64> {
    let mut rng = match seed {
        Some(seed) => SpsaRng::seed_from_u64(seed),
        None => SpsaRng::from_entropy(),
    };
    Ok(tools::simulate_experiment(refvalue, measurements, &mut rng)?)
}

/// _complex_spsa — PyO3 module initializer.
///
/// Registers `optimize`, `simulate_experiment` and the list of algorithm
/// names `ALGORITHMS`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _complex_spsa<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(optimize, m)?)?;
    m.add_function(wrap_pyfunction!(py_simulate_experiment, m)?)?;
    let names: Vec<&str> = Algorithm::ALL.iter().map(|alg| alg.name()).collect();
    m.add("ALGORITHMS", names)?;
    Ok(())
}
