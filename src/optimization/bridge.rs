//! bridge — Real↔Complex variable bridge.
//!
//! Purpose
//! -------
//! Lift a problem over `N` complex variables to one over `2N` real
//! variables and back, so that every real-domain optimizer can be applied
//! to complex problems unchanged.
//!
//! Key behaviors
//! -------------
//! - [`unfold`] maps `z ∈ ℂᴺ` to `x = [Re z; Im z] ∈ ℝ²ᴺ` (concatenation).
//! - [`fold`] is its exact inverse and rejects odd-length input.
//! - [`RealView`] / [`RealMetricView`] wrap complex objectives and metrics
//!   so that they accept the unfolded real vector.
//! - [`fold_trajectory`] folds each column of a `2N × Niters` real
//!   trajectory into an `N × Niters` complex one.
//!
//! Invariants & assumptions
//! ------------------------
//! - The map is a fixed linear bijection: no rounding, no randomness.
//!   `fold(&unfold(&z)) == z` holds bit for bit.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the exact round trip, odd-length rejection, the
//!   wrapped objective/metric values and trajectory folding.
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::{
        traits::{Metric, Objective},
        types::{Point, Trajectory},
    },
};
use ndarray::{Array1, Array2, s};
use num_complex::Complex64;

/// `z ↦ [Re z; Im z]`.
pub fn unfold(z: &Point<Complex64>) -> Point<f64> {
    let re = z.mapv(|c| c.re);
    let im = z.mapv(|c| c.im);
    let mut x = Array1::zeros(2 * z.len());
    x.slice_mut(s![..z.len()]).assign(&re);
    x.slice_mut(s![z.len()..]).assign(&im);
    x
}

/// `[a; b] ↦ a + i·b`.
///
/// # Errors
/// Returns [`OptError::OddRealLength`] if `x.len()` is odd.
pub fn fold(x: &Point<f64>) -> OptResult<Point<Complex64>> {
    if x.len() % 2 != 0 {
        return Err(OptError::OddRealLength { len: x.len() });
    }
    Ok(fold_halves(x))
}

/// Fold every column of a `2N × Niters` trajectory.
///
/// # Errors
/// Returns [`OptError::OddRealLength`] if the row count is odd.
pub fn fold_trajectory(trajectory: &Trajectory<f64>) -> OptResult<Trajectory<Complex64>> {
    let rows = trajectory.nrows();
    if rows % 2 != 0 {
        return Err(OptError::OddRealLength { len: rows });
    }
    let n = rows / 2;
    Ok(Array2::from_shape_fn((n, trajectory.ncols()), |(i, k)| {
        Complex64::new(trajectory[[i, k]], trajectory[[i + n, k]])
    }))
}

/// Inverse of [`fold_trajectory`].
pub fn unfold_trajectory(trajectory: &Trajectory<Complex64>) -> Trajectory<f64> {
    let n = trajectory.nrows();
    Array2::from_shape_fn((2 * n, trajectory.ncols()), |(i, k)| {
        if i < n { trajectory[[i, k]].re } else { trajectory[[i - n, k]].im }
    })
}

fn fold_halves(x: &Point<f64>) -> Point<Complex64> {
    let n = x.len() / 2;
    Array1::from_shape_fn(n, |i| Complex64::new(x[i], x[i + n]))
}

/// A complex objective seen as a function of `2N` reals.
#[derive(Debug)]
pub struct RealView<'a, O: ?Sized> {
    inner: &'a O,
}

impl<'a, O: ?Sized> RealView<'a, O> {
    pub fn new(inner: &'a O) -> Self {
        Self { inner }
    }
}

impl<'a, O: Objective<Complex64> + ?Sized> Objective<f64> for RealView<'a, O> {
    fn value(&self, x: &Point<f64>) -> f64 {
        self.inner.value(&fold_halves(x))
    }

    fn dim(&self) -> Option<usize> {
        self.inner.dim().map(|n| 2 * n)
    }
}

/// A complex metric seen as a function of two `2N`-real vectors.
#[derive(Debug)]
pub struct RealMetricView<'a, M: ?Sized> {
    inner: &'a M,
}

impl<'a, M: ?Sized> RealMetricView<'a, M> {
    pub fn new(inner: &'a M) -> Self {
        Self { inner }
    }
}

impl<'a, M: Metric<Complex64> + ?Sized> Metric<f64> for RealMetricView<'a, M> {
    fn value(&self, x1: &Point<f64>, x2: &Point<f64>) -> f64 {
        self.inner.value(&fold_halves(x1), &fold_halves(x2))
    }

    fn dim(&self) -> Option<usize> {
        self.inner.dim().map(|n| 2 * n)
    }
}
