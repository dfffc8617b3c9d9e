//! spsa::gains — gain parameters, step-size schedules and calibration.
//!
//! Purpose
//! -------
//! Turn the five scalar gain parameters `{a, b, A, s, t}` into the
//! step-size sequences `aᵏ = a / (k + A + 1)^s` and `bᵏ = b / (k + 1)^t`,
//! and optionally rescale `a` from the objective's measured sensitivity
//! before the first iteration.
//!
//! Key behaviors
//! -------------
//! - [`Gains`] is a plain `Copy` value; [`DEFAULT_GAINS`] is the immutable
//!   crate-wide default and [`Gains::default`] returns it.
//! - [`GainSchedule`] maps a 1-based loop iteration to the gain index `k`,
//!   honoring `initial_iteration` and `constant_learning_rate`.
//! - [`calibrate_gain_a`] rescales `a` so that the first step has a target
//!   magnitude.
//!
//! Invariants & assumptions
//! ------------------------
//! - Gains are never validated: zero or negative inputs propagate through
//!   the formulas and may yield `Inf`/`NaN` iterates.
//! - For positive inputs and a decaying schedule both sequences are
//!   strictly positive and non-increasing in `k`.
//!
//! Conventions
//! -----------
//! - `k` is the gain index, not the trajectory position; the two differ
//!   when `initial_iteration != 1`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the closed-form values, monotonicity, the constant
//!   schedule, and calibration (including the zero-difference skip).
use crate::optimization::spsa::{
    perturbation::sample_perturbation,
    traits::Objective,
    types::{Point, SpsaScalar},
};
use rand::Rng;

/// Gain parameters controlling step-size decay.
///
/// - `a`: numerator of the update gain `aᵏ`.
/// - `b`: numerator of the perturbation gain `bᵏ`.
/// - `stability`: the stability constant `A` in `aᵏ`.
/// - `s`: decay exponent of `aᵏ`.
/// - `t`: decay exponent of `bᵏ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub a: f64,
    pub b: f64,
    pub stability: f64,
    pub s: f64,
    pub t: f64,
}

/// Standard gains used whenever a caller does not override them.
pub const DEFAULT_GAINS: Gains = Gains { a: 3.0, b: 0.1, stability: 0.0, s: 0.602, t: 0.101 };

impl Default for Gains {
    fn default() -> Self {
        DEFAULT_GAINS
    }
}

impl Gains {
    pub fn new(a: f64, b: f64, stability: f64, s: f64, t: f64) -> Self {
        Self { a, b, stability, s, t }
    }

    /// Copy of these gains with a different `a`.
    pub fn with_a(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// `aᵏ = a / (k + A + 1)^s`
    pub fn a_k(&self, k: usize) -> f64 {
        self.a / (k as f64 + self.stability + 1.0).powf(self.s)
    }

    /// `bᵏ = b / (k + 1)^t`
    pub fn b_k(&self, k: usize) -> f64 {
        self.b / (k as f64 + 1.0).powf(self.t)
    }
}

/// Step-size schedule for one optimization run.
///
/// Iterations are counted from 1. The gain index of iteration `i` is
/// `initial_iteration + i - 1`; with `constant_learning_rate` the index is
/// pinned to `initial_iteration`, so every iteration reuses the first
/// iteration's gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSchedule {
    gains: Gains,
    initial_iteration: usize,
    constant: bool,
}

impl GainSchedule {
    pub fn new(gains: Gains, initial_iteration: usize, constant: bool) -> Self {
        Self { gains, initial_iteration, constant }
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    /// Replace `a`, e.g. after calibration.
    pub fn set_a(&mut self, a: f64) {
        self.gains.a = a;
    }

    /// Gain index `k` for the 1-based loop iteration `iteration`.
    pub fn index(&self, iteration: usize) -> usize {
        if self.constant {
            self.initial_iteration
        } else {
            self.initial_iteration + iteration.saturating_sub(1)
        }
    }

    /// `(aᵏ, bᵏ)` for the 1-based loop iteration `iteration`.
    pub fn at(&self, iteration: usize) -> (f64, f64) {
        let k = self.index(iteration);
        (self.gains.a_k(k), self.gains.b_k(k))
    }

    /// Second-order step coefficient `1/(k + A + 1)^s`: the `a` gain
    /// sequence with `a = 1`, independent of calibration.
    pub fn unit_a_at(&self, iteration: usize) -> f64 {
        self.gains.with_a(1.0).a_k(self.index(iteration))
    }
}

/// calibrate_gain_a — rescale `a` from the objective's measured sensitivity.
///
/// Purpose
/// -------
/// The raw gain `a` has no natural scale across objectives with different
/// Lipschitz constants. Following Kandala et al. (2017), draw `samples`
/// perturbations at the initial point, measure the mean absolute difference
/// `m = mean |f(z + b¹Δ) − f(z − b¹Δ)|`, and return `a · 2b¹ / m`, which
/// makes the first gradient step have magnitude `a¹` per unit of the
/// measured gradient scale.
///
/// Parameters
/// ----------
/// - `objective`: objective to probe; evaluated `2 · samples` times.
/// - `z0`: initial point.
/// - `a`: gain to rescale.
/// - `b1`: perturbation gain of the first iteration.
/// - `samples`: number of perturbation pairs (`Ncalibrate`).
/// - `rng`: generator shared with the subsequent iterations.
///
/// Returns
/// -------
/// The calibrated `a`. When `samples == 0` or the measured mean difference
/// is not strictly positive (e.g. a flat objective), `a` is returned
/// unchanged so that no division by zero can occur.
pub fn calibrate_gain_a<S, O, R>(
    objective: &O, z0: &Point<S>, a: f64, b1: f64, samples: usize, rng: &mut R,
) -> f64
where
    S: SpsaScalar,
    O: Objective<S> + ?Sized,
    R: Rng + ?Sized,
{
    if samples == 0 {
        return a;
    }
    let mut total = 0.0;
    for _ in 0..samples {
        let delta: Point<S> = sample_perturbation(rng, z0.len());
        let step = delta.mapv(|d| d * S::lift(b1));
        let diff = objective.value(&(z0 + &step)) - objective.value(&(z0 - &step));
        total += diff.abs();
    }
    let mean = total / samples as f64;
    if mean > 0.0 { a * 2.0 * b1 / mean } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::spsa::{traits::ObjectiveFn, types::SpsaRng};
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Closed-form gain values and their positivity/monotonicity.
    // - Index mapping with `initial_iteration`, the constant schedule and the
    //   second-order unit-`a` coefficient.
    // - Calibration rescaling and the zero-difference skip.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Check the closed-form gains at k = 1 for the default parameters.
    //
    // Given
    // -----
    // - `DEFAULT_GAINS`.
    //
    // Expect
    // ------
    // - a¹ = 3 / 2^0.602 and b¹ = 0.1 / 2^0.101.
    fn default_gains_match_closed_form_at_first_iteration() {
        let gains = Gains::default();
        assert_relative_eq!(gains.a_k(1), 3.0 / 2f64.powf(0.602), max_relative = 1e-12);
        assert_relative_eq!(gains.b_k(1), 0.1 / 2f64.powf(0.101), max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Gains stay strictly positive and never increase along a decaying
    // schedule.
    //
    // Given
    // -----
    // - Positive gains and a schedule with `constant = false`.
    //
    // Expect
    // ------
    // - aᵏ > 0, bᵏ > 0 and aᵏ⁺¹ ≤ aᵏ, bᵏ⁺¹ ≤ bᵏ for k in 1..=500.
    fn decaying_schedule_is_positive_and_non_increasing() {
        // Arrange
        let schedule = GainSchedule::new(Gains::new(0.7, 0.2, 5.0, 0.8, 0.3), 1, false);

        // Act
        let values: Vec<(f64, f64)> = (1..=500).map(|i| schedule.at(i)).collect();

        // Assert
        for window in values.windows(2) {
            let (a0, b0) = window[0];
            let (a1, b1) = window[1];
            assert!(a0 > 0.0 && b0 > 0.0 && a1 > 0.0 && b1 > 0.0);
            assert!(a1 <= a0);
            assert!(b1 <= b0);
        }
    }

    #[test]
    // Purpose
    // -------
    // The constant schedule reuses the first iteration's gains.
    //
    // Given
    // -----
    // - `constant = true`, `initial_iteration = 1`.
    //
    // Expect
    // ------
    // - `at(i) == at(1)` for every i.
    fn constant_schedule_repeats_first_gains() {
        let schedule = GainSchedule::new(DEFAULT_GAINS, 1, true);
        let first = schedule.at(1);
        for i in [2, 10, 1_000] {
            assert_eq!(schedule.at(i), first);
        }
    }

    #[test]
    // Purpose
    // -------
    // `initial_iteration` shifts the gain index without touching the loop
    // counter.
    //
    // Given
    // -----
    // - `initial_iteration = 20`.
    //
    // Expect
    // ------
    // - Iteration 1 uses k = 20 and iteration 5 uses k = 24.
    fn initial_iteration_offsets_gain_index() {
        let schedule = GainSchedule::new(DEFAULT_GAINS, 20, false);
        assert_eq!(schedule.index(1), 20);
        assert_eq!(schedule.index(5), 24);
        assert_eq!(schedule.at(1), (DEFAULT_GAINS.a_k(20), DEFAULT_GAINS.b_k(20)));
    }

    #[test]
    // Purpose
    // -------
    // The second-order coefficient follows the `a` sequence with `a = 1`,
    // regardless of the configured or calibrated `a`.
    //
    // Given
    // -----
    // - Gains with a = 7, A = 2, s = 0.5, `initial_iteration = 3`, then `a`
    //   replaced by 0.01.
    //
    // Expect
    // ------
    // - Iteration 2 uses k = 4, so the coefficient is 1 / 7^0.5 both before
    //   and after `set_a`.
    fn unit_a_coefficient_ignores_configured_a() {
        let mut schedule = GainSchedule::new(Gains::new(7.0, 0.1, 2.0, 0.5, 0.1), 3, false);
        let expected = 1.0 / 7f64.sqrt();
        assert_relative_eq!(schedule.unit_a_at(2), expected, max_relative = 1e-12);
        schedule.set_a(0.01);
        assert_relative_eq!(schedule.unit_a_at(2), expected, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Calibration on a linear objective rescales `a` by 1 / |slope|.
    //
    // Given
    // -----
    // - f(x) = 4x in one variable, so |f(x + bΔ) − f(x − bΔ)| = 8b exactly.
    //
    // Expect
    // ------
    // - Calibrated a = a · 2b / 8b = a / 4.
    fn calibration_rescales_a_on_linear_objective() {
        // Arrange
        let f = ObjectiveFn::new(|x: &Point<f64>| 4.0 * x[0]);
        let z0 = array![0.3];
        let mut rng = SpsaRng::seed_from_u64(5);
        let b1 = DEFAULT_GAINS.b_k(1);

        // Act
        let a = calibrate_gain_a(&f, &z0, 3.0, b1, 25, &mut rng);

        // Assert
        assert_relative_eq!(a, 0.75, max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A flat objective leaves `a` unchanged instead of dividing by zero.
    //
    // Given
    // -----
    // - f ≡ 1.
    //
    // Expect
    // ------
    // - The returned gain equals the input gain.
    fn calibration_skips_flat_objective() {
        let f = ObjectiveFn::new(|_: &Point<f64>| 1.0);
        let z0 = array![0.0, 0.0];
        let mut rng = SpsaRng::seed_from_u64(9);
        let a = calibrate_gain_a(&f, &z0, 3.0, 0.1, 10, &mut rng);
        assert_eq!(a, 3.0);
    }
}
