//! spsa::engine — update strategies and the iteration state machine.
//!
//! Purpose
//! -------
//! Tie the perturbation sampler, gain schedule, estimators and curvature
//! solve together into one sequential optimization loop that records every
//! iterate into an `N × Niters` trajectory.
//!
//! Key behaviors
//! -------------
//! - [`UpdateRule`] is the capability interface every strategy implements:
//!   `estimate_gradient`, optional `estimate_curvature`, and `apply_update`.
//!   - [`FirstOrderRule`]: gradient only (SPSA, CSPSA).
//!   - [`HessianRule`]: curvature from four objective evaluations (2-SPSA,
//!     CSPSA2).
//!   - [`MetricRule`]: curvature from four metric evaluations (QN variants).
//! - [`SpsaEngine`] walks the phases
//!   `Calibrating → FirstOrderWarmup → SteadyIteration → Done`, one
//!   transition per [`SpsaEngine::step`], and exposes the running curvature
//!   estimate for inspection.
//!
//! Invariants & assumptions
//! ------------------------
//! - Exactly `niters` iterations run; column `i - 1` of the trajectory is
//!   the iterate after iteration `i`. The initial guess is not stored.
//! - During warmup (`i ≤ hessian_delay`) the curvature estimate stays at its
//!   seed `curvature_seed · I` and no curvature evaluations are made.
//! - After warmup the step is `sign · cᵏ · H_reg⁻¹ g` with
//!   `cᵏ = 1/(k + A + 1)^s`, the gain schedule evaluated at `a = 1`. The
//!   configured (or calibrated) `a` is only consumed by first-order steps.
//! - Shape problems are reported by [`SpsaEngine::new`]; nothing after that
//!   returns an error. Non-finite evaluations flow into the trajectory.
//!
//! Conventions
//! -----------
//! - The running curvature is the sample mean of the seed and every
//!   post-warmup estimate, `H ← (m·H + δH)/(m + 1)` with `m` one more than
//!   the number of estimates folded in so far. The seed keeps weight
//!   `1/(m + 1)` and is never replaced outright.
//! - One generator drives calibration and all iterations, so a fixed seed
//!   reproduces the whole run bit for bit.
//!
//! Downstream usage
//! ----------------
//! - The entry points in `api` build a rule, call [`SpsaEngine::new`] and
//!   then [`SpsaEngine::run`]. Callers needing per-iteration control can
//!   drive [`SpsaEngine::step`] themselves.
//!
//! Testing notes
//! -------------
//! - Unit tests cover phase sequencing, warmup behavior of the curvature
//!   estimate, the scaled second-order recurrence on a one-dimensional
//!   quadratic, constant-rate stepping, and NaN propagation.
use crate::optimization::{
    errors::OptResult,
    spsa::{
        estimators::{estimate_curvature, estimate_gradient},
        gains::{GainSchedule, calibrate_gain_a},
        perturbation::sample_perturbation,
        regularization::{Preconditioner, Regularization, curvature_step},
        traits::{Metric, Objective, SpsaOptions},
        types::{Curvature, Point, SpsaRng, SpsaScalar, Trajectory},
        validation::validate_guess,
    },
};
use ndarray::Array2;
use rand::SeedableRng;
use tracing::{debug, info_span, trace};

/// Capability interface shared by all SPSA-family strategies.
pub trait UpdateRule<S: SpsaScalar> {
    type Objective: Objective<S> + ?Sized;

    /// Short strategy name used in log records.
    fn name(&self) -> &'static str;

    /// The objective being optimized.
    fn objective(&self) -> &Self::Objective;

    /// Whether the strategy maintains a curvature estimate.
    fn uses_curvature(&self) -> bool {
        false
    }

    fn estimate_gradient(&self, z: &Point<S>, delta: &Point<S>, b_k: f64) -> Point<S> {
        estimate_gradient(self.objective(), z, delta, b_k)
    }

    /// One curvature sample, or `None` for first-order strategies.
    fn estimate_curvature(
        &self, _z: &Point<S>, _d1: &Point<S>, _d2: &Point<S>, _b_k: f64,
    ) -> Option<Curvature<S>> {
        None
    }

    /// `z ← z + sign · step`.
    fn apply_update(&self, z: &mut Point<S>, step: &Point<S>, sign: f64) {
        z.scaled_add(S::lift(sign), step);
    }
}

/// Gradient-only strategy.
#[derive(Debug)]
pub struct FirstOrderRule<'a, O: ?Sized> {
    objective: &'a O,
}

impl<'a, O: ?Sized> FirstOrderRule<'a, O> {
    pub fn new(objective: &'a O) -> Self {
        Self { objective }
    }
}

impl<'a, S: SpsaScalar, O: Objective<S> + ?Sized> UpdateRule<S> for FirstOrderRule<'a, O> {
    type Objective = O;

    fn name(&self) -> &'static str {
        "first-order"
    }

    fn objective(&self) -> &O {
        self.objective
    }
}

/// Second-order strategy estimating the Hessian of the objective.
#[derive(Debug)]
pub struct HessianRule<'a, O: ?Sized> {
    objective: &'a O,
}

impl<'a, O: ?Sized> HessianRule<'a, O> {
    pub fn new(objective: &'a O) -> Self {
        Self { objective }
    }
}

impl<'a, S: SpsaScalar, O: Objective<S> + ?Sized> UpdateRule<S> for HessianRule<'a, O> {
    type Objective = O;

    fn name(&self) -> &'static str {
        "hessian"
    }

    fn objective(&self) -> &O {
        self.objective
    }

    fn uses_curvature(&self) -> bool {
        true
    }

    fn estimate_curvature(
        &self, z: &Point<S>, d1: &Point<S>, d2: &Point<S>, b_k: f64,
    ) -> Option<Curvature<S>> {
        Some(estimate_curvature(|w: &Point<S>| self.objective.value(w), z, d1, d2, b_k))
    }
}

/// Natural-gradient strategy estimating the Hessian of `w ↦ metric(z, w)`.
#[derive(Debug)]
pub struct MetricRule<'a, O: ?Sized, M: ?Sized> {
    objective: &'a O,
    metric: &'a M,
}

impl<'a, O: ?Sized, M: ?Sized> MetricRule<'a, O, M> {
    pub fn new(objective: &'a O, metric: &'a M) -> Self {
        Self { objective, metric }
    }
}

impl<'a, S, O, M> UpdateRule<S> for MetricRule<'a, O, M>
where
    S: SpsaScalar,
    O: Objective<S> + ?Sized,
    M: Metric<S> + ?Sized,
{
    type Objective = O;

    fn name(&self) -> &'static str {
        "metric"
    }

    fn objective(&self) -> &O {
        self.objective
    }

    fn uses_curvature(&self) -> bool {
        true
    }

    fn estimate_curvature(
        &self, z: &Point<S>, d1: &Point<S>, d2: &Point<S>, b_k: f64,
    ) -> Option<Curvature<S>> {
        Some(estimate_curvature(|w: &Point<S>| self.metric.value(z, w), z, d1, d2, b_k))
    }
}

/// Observable state of an [`SpsaEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Calibrating,
    FirstOrderWarmup,
    SteadyIteration,
    Done,
}

/// Sequential SPSA iteration loop over one trajectory.
#[derive(Debug)]
pub struct SpsaEngine<S: SpsaScalar, U: UpdateRule<S>> {
    rule: U,
    schedule: GainSchedule,
    sign: f64,
    calibration_samples: usize,
    hessian_delay: usize,
    regularization: Regularization,
    preconditioner: Preconditioner,
    z: Point<S>,
    curvature: Option<Curvature<S>>,
    curvature_updates: usize,
    calibrated: bool,
    iteration: usize,
    niters: usize,
    rng: SpsaRng,
    trajectory: Trajectory<S>,
}

impl<S: SpsaScalar, U: UpdateRule<S>> SpsaEngine<S, U> {
    /// Build an engine positioned before iteration 1.
    ///
    /// # Errors
    /// - [`crate::optimization::errors::OptError::EmptyGuess`] /
    ///   `GuessDimMismatch` from [`validate_guess`].
    /// - Option errors from [`SpsaOptions::validate`].
    pub fn new(rule: U, guess: Point<S>, niters: usize, opts: &SpsaOptions) -> OptResult<Self> {
        opts.validate()?;
        validate_guess::<S, _>(rule.objective(), guess.len())?;
        let n = guess.len();
        let rng = match opts.seed {
            Some(seed) => SpsaRng::seed_from_u64(seed),
            None => SpsaRng::from_entropy(),
        };
        let curvature = if rule.uses_curvature() {
            Some(Array2::from_diag_elem(n, S::lift(opts.curvature_seed)))
        } else {
            None
        };
        Ok(Self {
            rule,
            schedule: GainSchedule::new(opts.gains, opts.initial_iteration, opts.constant_learning_rate),
            sign: opts.sign(),
            calibration_samples: opts.calibration_samples,
            hessian_delay: opts.hessian_delay,
            regularization: opts.regularization,
            preconditioner: opts.preconditioner,
            z: guess,
            curvature,
            curvature_updates: 0,
            calibrated: false,
            iteration: 0,
            niters,
            rng,
            trajectory: Array2::zeros((n, niters)),
        })
    }

    pub fn phase(&self) -> Phase {
        if self.iteration >= self.niters {
            Phase::Done
        } else if !self.calibrated && self.calibration_samples > 0 {
            Phase::Calibrating
        } else if self.rule.uses_curvature() && self.iteration < self.hessian_delay {
            Phase::FirstOrderWarmup
        } else {
            Phase::SteadyIteration
        }
    }

    /// Current iterate.
    pub fn iterate(&self) -> &Point<S> {
        &self.z
    }

    /// Number of completed iterations.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Running curvature estimate; `None` for first-order strategies.
    pub fn curvature(&self) -> Option<&Curvature<S>> {
        self.curvature.as_ref()
    }

    /// Current (possibly calibrated) gain `a`.
    pub fn gain_a(&self) -> f64 {
        self.schedule.gains().a
    }

    /// Perform one transition and return the phase reached.
    pub fn step(&mut self) -> Phase {
        match self.phase() {
            Phase::Done => {}
            Phase::Calibrating => self.calibrate(),
            Phase::FirstOrderWarmup => self.iterate_once(false),
            Phase::SteadyIteration => self.iterate_once(self.rule.uses_curvature()),
        }
        self.phase()
    }

    /// Run to completion and return the trajectory.
    pub fn run(mut self) -> Trajectory<S> {
        let span = info_span!(
            "spsa",
            rule = self.rule.name(),
            dim = self.z.len(),
            niters = self.niters,
        );
        let _guard = span.enter();
        while self.step() != Phase::Done {}
        self.trajectory
    }

    fn calibrate(&mut self) {
        let (_, b1) = self.schedule.at(1);
        let a = self.schedule.gains().a;
        let calibrated = calibrate_gain_a(
            self.rule.objective(),
            &self.z,
            a,
            b1,
            self.calibration_samples,
            &mut self.rng,
        );
        debug!(samples = self.calibration_samples, a, calibrated, "calibrated gain a");
        self.schedule.set_a(calibrated);
        self.calibrated = true;
    }

    fn iterate_once(&mut self, second_order: bool) {
        let i = self.iteration + 1;
        let (a_k, b_k) = self.schedule.at(i);
        trace!(iteration = i, a_k, b_k, "gains");

        let n = self.z.len();
        let delta: Point<S> = sample_perturbation(&mut self.rng, n);
        let g = self.rule.estimate_gradient(&self.z, &delta, b_k);

        let step = if second_order {
            if self.curvature_updates == 0 {
                debug!(iteration = i, "curvature accumulation started");
            }
            let d2: Point<S> = sample_perturbation(&mut self.rng, n);
            let sample = self.rule.estimate_curvature(&self.z, &delta, &d2, b_k);
            match (self.curvature.as_mut(), sample) {
                (Some(h), Some(dh)) => {
                    // The seed counts as the first sample.
                    let weight = (self.curvature_updates + 1) as f64;
                    *h = (&*h * S::lift(weight) + dh) / S::lift(weight + 1.0);
                    self.curvature_updates += 1;
                    let coefficient = self.schedule.unit_a_at(i);
                    curvature_step(h, &g, self.regularization, self.preconditioner)
                        .mapv(|x| x * S::lift(coefficient))
                }
                _ => g.mapv(|x| x * S::lift(a_k)),
            }
        } else {
            g.mapv(|x| x * S::lift(a_k))
        };

        self.rule.apply_update(&mut self.z, &step, self.sign);
        self.trajectory.column_mut(i - 1).assign(&self.z);
        self.iteration = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::spsa::traits::{MetricFn, ObjectiveFn};
    use crate::optimization::spsa::gains::{DEFAULT_GAINS, Gains};
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Phase sequencing with and without calibration and warmup.
    // - The curvature estimate during and after warmup.
    // - Scaled Newton steps on a 1-D quadratic, the metric rule's curvature
    //   source and the weight of the curvature seed.
    // - Non-finite propagation and shape errors.
    // -------------------------------------------------------------------------

    fn shifted_square(x: &Point<f64>) -> f64 {
        (x[0] - 3.0).powi(2)
    }

    #[test]
    // Purpose
    // -------
    // Phases follow Calibrating → FirstOrderWarmup → SteadyIteration → Done.
    //
    // Given
    // -----
    // - A Hessian rule, 2 calibration samples, delay 2, 4 iterations.
    //
    // Expect
    // ------
    // - The observed phase sequence after each step matches the schedule.
    fn phases_follow_calibration_warmup_steady_done() {
        // Arrange
        let f = ObjectiveFn::new(shifted_square);
        let opts = SpsaOptions::default()
            .with_calibration_samples(2)
            .with_hessian_delay(2)
            .with_seed(1);
        let mut engine =
            SpsaEngine::new(HessianRule::new(&f), array![0.0], 4, &opts).expect("valid engine");

        // Act
        let mut phases = vec![engine.phase()];
        while *phases.last().expect("non-empty") != Phase::Done {
            phases.push(engine.step());
        }

        // Assert
        assert_eq!(
            phases,
            vec![
                Phase::Calibrating,
                Phase::FirstOrderWarmup,
                Phase::FirstOrderWarmup,
                Phase::SteadyIteration,
                Phase::SteadyIteration,
                Phase::Done,
            ]
        );
    }

    #[test]
    // Purpose
    // -------
    // First-order rules never enter warmup and carry no curvature.
    //
    // Given
    // -----
    // - A first-order rule with `hessian_delay = 5`.
    //
    // Expect
    // ------
    // - Initial phase is SteadyIteration and `curvature()` is `None`.
    fn first_order_rule_skips_warmup() {
        let f = ObjectiveFn::new(shifted_square);
        let opts = SpsaOptions::default().with_hessian_delay(5).with_seed(1);
        let engine = SpsaEngine::new(FirstOrderRule::new(&f), array![0.0], 3, &opts).expect("valid");
        assert_eq!(engine.phase(), Phase::SteadyIteration);
        assert!(engine.curvature().is_none());
    }

    #[test]
    // Purpose
    // -------
    // The curvature estimate stays at its seed through the warmup and starts
    // changing on the first post-warmup iteration.
    //
    // Given
    // -----
    // - A 2-D quadratic with a coupling term, a = 0.1, seed H = I,
    //   `hessian_delay = 10`.
    //
    // Expect
    // ------
    // - H == I after each of iterations 1..=10; H != I after iteration 11.
    fn curvature_is_frozen_during_warmup() {
        // Arrange
        let f = ObjectiveFn::new(|x: &Point<f64>| x[0].powi(2) + x[0] * x[1] + x[1].powi(2));
        let opts = SpsaOptions::default()
            .with_gains(Gains::default().with_a(0.1))
            .with_hessian_delay(10)
            .with_curvature_seed(1.0)
            .with_seed(8);
        let mut engine =
            SpsaEngine::new(HessianRule::new(&f), array![0.5, -0.5], 20, &opts).expect("valid");
        let seed = Array2::<f64>::eye(2);

        // Act + Assert
        for _ in 1..=10 {
            engine.step();
            assert_eq!(engine.curvature(), Some(&seed));
        }
        engine.step();
        assert_eq!(engine.iteration(), 11);
        assert_ne!(engine.curvature(), Some(&seed));
    }

    /// Options under which the 1-D second-order recurrences are exact: the
    /// seed matches the true curvature 2 and no shift is added.
    fn exact_curvature_opts() -> SpsaOptions {
        SpsaOptions::default()
            .with_curvature_seed(2.0)
            .with_regularization(Regularization::MatrixModulus { shift: 0.0 })
            .with_seed(4)
    }

    #[test]
    // Purpose
    // -------
    // On a 1-D quadratic the gradient and curvature estimates are exact, so
    // each second-order step is the Newton step scaled by cᵏ = 1/(k + 1)^s.
    //
    // Given
    // -----
    // - f(x) = (x − 3)², guess 0, seed H₀ = 2, no shift, 3 iterations.
    //
    // Expect
    // ------
    // - The error follows eᵏ = (1 − cᵏ)·eᵏ⁻¹ from e⁰ = 3.
    fn hessian_rule_takes_scaled_newton_steps_in_one_dimension() {
        // Arrange
        let f = ObjectiveFn::new(shifted_square);
        let s = DEFAULT_GAINS.s;
        let opts = exact_curvature_opts();

        // Act
        let trajectory =
            SpsaEngine::new(HessianRule::new(&f), array![0.0], 3, &opts).expect("valid").run();

        // Assert
        let mut error = 3.0;
        for k in 1..=3 {
            error *= 1.0 - 1.0 / ((k + 1) as f64).powf(s);
            assert_abs_diff_eq!(trajectory[[0, k - 1]], 3.0 - error, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // The metric rule preconditions with the metric's curvature rather than
    // the objective's.
    //
    // Given
    // -----
    // - f(x) = 5(x − 3)² with curvature 10, so g = −30 at the guess 0.
    // - Metric −½·exp(−2(x₁ − x₂)²) with curvature ≈ 2 at coincidence.
    // - Seed H₀ = 2, no shift, one iteration.
    //
    // Expect
    // ------
    // - Hessian rule: H = (2 + 10)/2, so x¹ = 5c¹ exactly.
    // - Metric rule: H ≈ (2 + 2)/2, so x¹ ≈ 15c¹.
    fn metric_rule_uses_metric_curvature() {
        // Arrange
        let f = ObjectiveFn::new(|x: &Point<f64>| 5.0 * (x[0] - 3.0).powi(2));
        let m = MetricFn::new(|a: &Point<f64>, b: &Point<f64>| {
            -0.5 * (-2.0 * (a[0] - b[0]).powi(2)).exp()
        });
        let c1 = 1.0 / 2f64.powf(DEFAULT_GAINS.s);
        let opts = exact_curvature_opts();

        // Act
        let hessian =
            SpsaEngine::new(HessianRule::new(&f), array![0.0], 1, &opts).expect("valid").run();
        let metric =
            SpsaEngine::new(MetricRule::new(&f, &m), array![0.0], 1, &opts).expect("valid").run();

        // Assert
        assert_abs_diff_eq!(hessian[[0, 0]], 5.0 * c1, epsilon = 1e-8);
        assert_abs_diff_eq!(metric[[0, 0]], 15.0 * c1, epsilon = 0.3);
    }

    #[test]
    // Purpose
    // -------
    // The curvature seed is kept as a prior sample instead of being
    // overwritten by the first estimate.
    //
    // Given
    // -----
    // - f(x) = (x − 3)² with exact curvature samples δH = 2.
    // - Seed H₀ = 6.
    //
    // Expect
    // ------
    // - After one update H = (6 + 2)/2 = 4; after two H = (2·4 + 2)/3.
    fn curvature_seed_is_weighted_as_first_sample() {
        let f = ObjectiveFn::new(shifted_square);
        let opts = SpsaOptions::default().with_curvature_seed(6.0).with_seed(3);
        let mut engine =
            SpsaEngine::new(HessianRule::new(&f), array![0.0], 2, &opts).expect("valid");

        engine.step();
        let h1 = engine.curvature().expect("second-order rule")[[0, 0]];
        engine.step();
        let h2 = engine.curvature().expect("second-order rule")[[0, 0]];

        assert_abs_diff_eq!(h1, 4.0, epsilon = 1e-8);
        assert_abs_diff_eq!(h2, 10.0 / 3.0, epsilon = 1e-8);
    }

    #[test]
    // Purpose
    // -------
    // A NaN objective value propagates into the trajectory instead of
    // stopping the run.
    //
    // Given
    // -----
    // - f ≡ NaN, 3 iterations.
    //
    // Expect
    // ------
    // - A full 1×3 trajectory of NaN.
    fn nan_objective_propagates_into_trajectory() {
        let f = ObjectiveFn::new(|_: &Point<f64>| f64::NAN);
        let opts = SpsaOptions::default().with_seed(2);
        let trajectory =
            SpsaEngine::new(FirstOrderRule::new(&f), array![1.0], 3, &opts).expect("valid").run();
        assert_eq!(trajectory.dim(), (1, 3));
        assert!(trajectory.iter().all(|x| x.is_nan()));
    }

    #[test]
    // Purpose
    // -------
    // Shape problems are reported before any iteration.
    //
    // Given
    // -----
    // - An empty guess.
    //
    // Expect
    // ------
    // - `SpsaEngine::new` fails.
    fn empty_guess_is_rejected() {
        let f = ObjectiveFn::new(|_: &Point<f64>| 0.0);
        let opts = SpsaOptions::default();
        assert!(SpsaEngine::new(FirstOrderRule::new(&f), Array1::<f64>::zeros(0), 3, &opts).is_err());
    }
}
