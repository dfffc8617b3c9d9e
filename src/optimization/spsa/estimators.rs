//! spsa::estimators — simultaneous-perturbation gradient and curvature estimates.
//!
//! Purpose
//! -------
//! Estimate `∂f/∂z̄` (complex) or `∇f` (real) from two objective evaluations,
//! and the Hessian or metric from four further evaluations, independent of
//! the number of variables `N`.
//!
//! Key behaviors
//! -------------
//! - [`estimate_gradient`]:
//!   `g = (f(z + bΔ) − f(z − bΔ)) / (2b) · conj(Δ)⁻¹`.
//! - [`estimate_curvature`]: with `F` the objective or `w ↦ metric(z, w)`,
//!   `δf = F(z + bΔ₁ + bΔ₂) − F(z + bΔ₁) − F(z − bΔ₁ + bΔ₂) + F(z − bΔ₁)` and
//!   `δH = δf / (2b²) · r₁ r₂ᴴ`, `r = conj(Δ)⁻¹`, followed by
//!   [`hermitize`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Perturbations have unit-modulus components, so the reciprocals are
//!   bounded.
//! - Non-finite evaluations are not intercepted; they propagate into the
//!   estimates.
//!
//! Testing notes
//! -------------
//! - The mean of many real gradient estimates on `xᵀQx` approaches `2Qx`;
//!   the mean curvature estimate approaches `2Q`.
//! - The bias on a quartic shrinks with `b`.
//! - The complex gradient of `|z − w|²` has mean `z − w`.
use crate::optimization::spsa::{
    traits::Objective,
    types::{Curvature, Point, SpsaScalar},
};
use ndarray::Array2;

/// Two-evaluation gradient estimate at `z` along `delta` with step `b_k`.
pub fn estimate_gradient<S, O>(objective: &O, z: &Point<S>, delta: &Point<S>, b_k: f64) -> Point<S>
where
    S: SpsaScalar,
    O: Objective<S> + ?Sized,
{
    let step = delta.mapv(|d| d * S::lift(b_k));
    let df = objective.value(&(z + &step)) - objective.value(&(z - &step));
    let scale = S::lift(df / (2.0 * b_k));
    delta.mapv(|d| d.conj_recip() * scale)
}

/// Four-evaluation curvature estimate.
///
/// `eval` is the objective for Hessian variants and `w ↦ metric(z, w)` for
/// natural-gradient variants. `d1` is the gradient's perturbation and `d2`
/// an independent draw.
pub fn estimate_curvature<S, F>(
    eval: F, z: &Point<S>, d1: &Point<S>, d2: &Point<S>, b_k: f64,
) -> Curvature<S>
where
    S: SpsaScalar,
    F: Fn(&Point<S>) -> f64,
{
    let b = S::lift(b_k);
    let s1 = d1.mapv(|d| d * b);
    let s2 = d2.mapv(|d| d * b);
    let plus = z + &s1;
    let minus = z - &s1;
    let df = eval(&(&plus + &s2)) - eval(&plus) - eval(&(&minus + &s2)) + eval(&minus);

    let scale = S::lift(df / (2.0 * b_k * b_k));
    let r1 = d1.mapv(S::conj_recip);
    let r2 = d2.mapv(S::conj_recip);
    let n = z.len();
    let dh = Array2::from_shape_fn((n, n), |(i, j)| r1[i] * r2[j].conjugate() * scale);
    hermitize(&dh)
}

/// `½(M + Mᴴ)`.
pub fn hermitize<S: SpsaScalar>(m: &Curvature<S>) -> Curvature<S> {
    let adjoint = m.t().mapv(|x| x.conjugate());
    (m + &adjoint) * S::lift(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::spsa::{
        perturbation::sample_perturbation,
        traits::ObjectiveFn,
        types::SpsaRng,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};
    use num_complex::Complex64;
    use rand::SeedableRng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Unbiasedness of the real gradient estimate on a quadratic.
    // - Bias shrinkage with b on a non-quadratic.
    // - Mean of the curvature estimate on a quadratic and Hermitian output.
    // - Mean of the complex gradient estimate.
    // -------------------------------------------------------------------------

    const DRAWS: usize = 20_000;

    fn quadratic() -> (Array2<f64>, impl Fn(&Point<f64>) -> f64) {
        let q = array![[2.0, 0.5], [0.5, 1.0]];
        let qc = q.clone();
        (q, move |x: &Point<f64>| x.dot(&qc.dot(x)))
    }

    #[test]
    // Purpose
    // -------
    // The sample mean of gradient estimates on xᵀQx approaches 2Qx.
    //
    // Given
    // -----
    // - Q = [[2, 0.5], [0.5, 1]], x = (1, −2), b = 0.1, 20_000 seeded draws.
    //
    // Expect
    // ------
    // - Mean estimate within 0.1 of 2Qx = (2, −3).
    fn gradient_mean_matches_quadratic_gradient() {
        // Arrange
        let (q, f) = quadratic();
        let objective = ObjectiveFn::new(f);
        let x = array![1.0, -2.0];
        let mut rng = SpsaRng::seed_from_u64(17);

        // Act
        let mut mean = Array1::<f64>::zeros(2);
        for _ in 0..DRAWS {
            let delta: Point<f64> = sample_perturbation(&mut rng, 2);
            mean += &estimate_gradient(&objective, &x, &delta, 0.1);
        }
        mean /= DRAWS as f64;

        // Assert
        let expected = q.dot(&x) * 2.0;
        assert_abs_diff_eq!(mean[0], expected[0], epsilon = 0.1);
        assert_abs_diff_eq!(mean[1], expected[1], epsilon = 0.1);
    }

    #[test]
    // Purpose
    // -------
    // The estimator bias shrinks as b decreases.
    //
    // Given
    // -----
    // - f(x) = x⁴ in one variable at x = 1; the estimate is exactly
    //   4x³ + 4xb² for either sign of Δ.
    //
    // Expect
    // ------
    // - Error 0.04 at b = 0.1 and 0.16 at b = 0.2.
    fn gradient_bias_shrinks_with_step() {
        let objective = ObjectiveFn::new(|x: &Point<f64>| x[0].powi(4));
        let x = array![1.0];
        let delta = array![-1.0];
        let coarse = estimate_gradient(&objective, &x, &delta, 0.2)[0] - 4.0;
        let fine = estimate_gradient(&objective, &x, &delta, 0.1)[0] - 4.0;
        assert_abs_diff_eq!(coarse, 0.16, epsilon = 1e-10);
        assert_abs_diff_eq!(fine, 0.04, epsilon = 1e-10);
        assert!(fine.abs() < coarse.abs());
    }

    #[test]
    // Purpose
    // -------
    // The sample mean of curvature estimates on xᵀQx approaches the Hessian
    // 2Q, and each estimate is symmetric.
    //
    // Given
    // -----
    // - Q = [[2, 0.5], [0.5, 1]], x = (0.3, 0.7), b = 0.1, 20_000 seeded
    //   draw pairs.
    //
    // Expect
    // ------
    // - Mean within 0.15 of 2Q entrywise; every estimate symmetric.
    fn curvature_mean_matches_quadratic_hessian() {
        // Arrange
        let (q, f) = quadratic();
        let x = array![0.3, 0.7];
        let mut rng = SpsaRng::seed_from_u64(23);

        // Act
        let mut mean = Array2::<f64>::zeros((2, 2));
        for _ in 0..DRAWS {
            let d1: Point<f64> = sample_perturbation(&mut rng, 2);
            let d2: Point<f64> = sample_perturbation(&mut rng, 2);
            let dh = estimate_curvature(&f, &x, &d1, &d2, 0.1);
            assert_eq!(dh[[0, 1]], dh[[1, 0]]);
            mean += &dh;
        }
        mean /= DRAWS as f64;

        // Assert
        for ((i, j), value) in mean.indexed_iter() {
            assert_abs_diff_eq!(*value, 2.0 * q[[i, j]], epsilon = 0.15);
        }
    }

    #[test]
    // Purpose
    // -------
    // The complex estimate on |z − w|² has mean ∂f/∂z̄ = z − w.
    //
    // Given
    // -----
    // - z = (1 + i, −0.5), w = (0.5, 0.5i), b = 0.1, 20_000 seeded draws.
    //
    // Expect
    // ------
    // - Mean within 0.05 of z − w in both real and imaginary parts.
    fn complex_gradient_mean_matches_conjugate_derivative() {
        // Arrange
        let w = array![Complex64::new(0.5, 0.0), Complex64::new(0.0, 0.5)];
        let wc = w.clone();
        let objective =
            ObjectiveFn::new(move |z: &Point<Complex64>| (z - &wc).iter().map(|d| d.norm_sqr()).sum::<f64>());
        let z = array![Complex64::new(1.0, 1.0), Complex64::new(-0.5, 0.0)];
        let mut rng = SpsaRng::seed_from_u64(29);

        // Act
        let mut mean = Array1::<Complex64>::zeros(2);
        for _ in 0..DRAWS {
            let delta: Point<Complex64> = sample_perturbation(&mut rng, 2);
            mean += &estimate_gradient(&objective, &z, &delta, 0.1);
        }
        mean /= Complex64::new(DRAWS as f64, 0.0);

        // Assert
        let expected = &z - &w;
        for (m, e) in mean.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(m.re, e.re, epsilon = 0.05);
            assert_abs_diff_eq!(m.im, e.im, epsilon = 0.05);
        }
    }

    #[test]
    // Purpose
    // -------
    // Complex curvature estimates are Hermitian.
    //
    // Given
    // -----
    // - A complex objective and one pair of draws.
    //
    // Expect
    // ------
    // - dh[i, j] == conj(dh[j, i]) and the diagonal is real.
    fn complex_curvature_is_hermitian() {
        let f = |z: &Point<Complex64>| z.iter().map(|c| c.norm_sqr() * c.re).sum::<f64>();
        let z = array![Complex64::new(0.2, -0.1), Complex64::new(1.0, 0.4), Complex64::new(-0.3, 0.0)];
        let mut rng = SpsaRng::seed_from_u64(31);
        let d1: Point<Complex64> = sample_perturbation(&mut rng, 3);
        let d2: Point<Complex64> = sample_perturbation(&mut rng, 3);
        let dh = estimate_curvature(f, &z, &d1, &d2, 0.1);
        for i in 0..3 {
            assert_eq!(dh[[i, i]].im, 0.0);
            for j in 0..3 {
                assert_eq!(dh[[i, j]], dh[[j, i]].conj());
            }
        }
    }
}
