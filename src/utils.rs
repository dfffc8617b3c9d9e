//! utils — Python argument extraction and callback adapters.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! used by the PyO3 glue in the crate root.
//!
//! - [`extract_f64_array`] / [`extract_complex_array`]: accept numpy arrays,
//!   pandas objects or plain sequences.
//! - [`build_spsa_options`]: turn keyword arguments into a validated
//!   [`SpsaOptions`].
//! - [`PyObjective`] / [`PyMetric`]: Python callables behind the
//!   `Objective`/`Metric` contracts. A Python exception cannot cross the
//!   engine (whose callbacks return plain `f64`), so the first one is parked
//!   and every later evaluation short-circuits to `NaN`; the caller re-raises
//!   it after the run.
#[cfg(feature = "python-bindings")]
use std::cell::RefCell;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use num_complex::Complex64;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::optimization::spsa::{
    gains::{DEFAULT_GAINS, Gains},
    traits::{Direction, Metric, Objective, SpsaOptions},
    types::{Point, SpsaScalar},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    Element,
    IntoPyArray,    // Array1 → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

#[cfg(feature = "python-bindings")]
pub fn extract_complex_array(raw_data: &Bound<'_, PyAny>) -> PyResult<Array1<Complex64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<Complex64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }
    let vec: Vec<Complex64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray or sequence of complex128",
        )
    })?;
    Ok(Array1::from(vec))
}

/// Build validated [`SpsaOptions`] from the Python keyword arguments.
///
/// Missing gain entries fall back to [`DEFAULT_GAINS`] one by one.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_spsa_options(
    a: Option<f64>, b: Option<f64>, stability: Option<f64>, s: Option<f64>, t: Option<f64>,
    sign: f64, ncalibrate: usize, hessian_delay: usize, initial_iteration: usize,
    constant_learning_rate: bool, seed: Option<u64>,
) -> PyResult<SpsaOptions> {
    let gains = Gains::new(
        a.unwrap_or(DEFAULT_GAINS.a),
        b.unwrap_or(DEFAULT_GAINS.b),
        stability.unwrap_or(DEFAULT_GAINS.stability),
        s.unwrap_or(DEFAULT_GAINS.s),
        t.unwrap_or(DEFAULT_GAINS.t),
    );
    let mut opts = SpsaOptions::default()
        .with_gains(gains)
        .with_direction(Direction::from_sign(sign)?)
        .with_calibration_samples(ncalibrate)
        .with_hessian_delay(hessian_delay)
        .with_initial_iteration(initial_iteration)
        .with_constant_learning_rate(constant_learning_rate);
    if let Some(seed) = seed {
        opts = opts.with_seed(seed);
    }
    opts.validate()?;
    Ok(opts)
}

/// A Python callable `f(z) -> float` seen as an [`Objective`].
#[cfg(feature = "python-bindings")]
pub struct PyObjective<'py> {
    func: Bound<'py, PyAny>,
    error: RefCell<Option<PyErr>>,
}

#[cfg(feature = "python-bindings")]
impl<'py> PyObjective<'py> {
    pub fn new(func: Bound<'py, PyAny>) -> Self {
        Self { func, error: RefCell::new(None) }
    }

    /// The first exception raised by the callable, if any.
    pub fn take_error(&self) -> Option<PyErr> {
        self.error.take()
    }
}

#[cfg(feature = "python-bindings")]
impl<'py, S: SpsaScalar + Element> Objective<S> for PyObjective<'py> {
    fn value(&self, z: &Point<S>) -> f64 {
        if self.error.borrow().is_some() {
            return f64::NAN;
        }
        let arg = z.clone().into_pyarray(self.func.py());
        match self.func.call1((arg,)).and_then(|r| r.extract::<f64>()) {
            Ok(v) => v,
            Err(e) => {
                park(&self.error, e);
                f64::NAN
            }
        }
    }
}

/// A Python callable `m(z1, z2) -> float` seen as a [`Metric`].
#[cfg(feature = "python-bindings")]
pub struct PyMetric<'py> {
    func: Bound<'py, PyAny>,
    error: RefCell<Option<PyErr>>,
}

#[cfg(feature = "python-bindings")]
impl<'py> PyMetric<'py> {
    pub fn new(func: Bound<'py, PyAny>) -> Self {
        Self { func, error: RefCell::new(None) }
    }

    /// The first exception raised by the callable, if any.
    pub fn take_error(&self) -> Option<PyErr> {
        self.error.take()
    }
}

#[cfg(feature = "python-bindings")]
impl<'py, S: SpsaScalar + Element> Metric<S> for PyMetric<'py> {
    fn value(&self, z1: &Point<S>, z2: &Point<S>) -> f64 {
        if self.error.borrow().is_some() {
            return f64::NAN;
        }
        let py = self.func.py();
        let args = (z1.clone().into_pyarray(py), z2.clone().into_pyarray(py));
        match self.func.call1(args).and_then(|r| r.extract::<f64>()) {
            Ok(v) => v,
            Err(e) => {
                park(&self.error, e);
                f64::NAN
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
fn park(slot: &RefCell<Option<PyErr>>, err: PyErr) {
    let mut slot = slot.borrow_mut();
    if slot.is_none() {
        *slot = Some(err);
    }
}
