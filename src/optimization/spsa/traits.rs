//! Public contracts and configuration for the SPSA engine.
//!
//! - [`Objective`] / [`Metric`]: evaluation contracts the engine calls.
//! - [`ObjectiveFn`] / [`MetricFn`]: closure adapters for both contracts.
//! - [`Direction`]: minimize or maximize (the optimization sign).
//! - [`SpsaOptions`]: gains, delays, calibration and curvature settings.
//! - [`Algorithm`]: the closed set of named variants, tagged by
//!   [`AlgorithmKind`] and [`VariableDomain`].
//!
//! Convention: objective and metric values are always real (`f64`), whatever
//! the scalar domain of the variables. Non-finite values are not errors; they
//! flow into the trajectory unchanged.
use crate::optimization::{
    errors::{OptError, OptResult},
    spsa::{
        gains::Gains,
        regularization::{Preconditioner, Regularization},
        types::Point,
    },
};
use std::str::FromStr;

/// Scalar objective over `N` real or complex variables.
///
/// Required:
/// - `value(&Point<S>) -> f64`: evaluate `f(z)`. May be stochastic.
///
/// Optional:
/// - `dim() -> Option<usize>`: expected number of variables. When `Some`,
///   the initial guess is checked against it before any evaluation.
pub trait Objective<S> {
    fn value(&self, z: &Point<S>) -> f64;

    fn dim(&self) -> Option<usize> {
        None
    }
}

/// Natural-gradient metric `m(z₁, z₂)`, conventionally `−½|⟨ψ(z₁)|ψ(z₂)⟩|²`
/// with values in `[-1, 0]`.
pub trait Metric<S> {
    fn value(&self, z1: &Point<S>, z2: &Point<S>) -> f64;

    fn dim(&self) -> Option<usize> {
        None
    }
}

/// Closure adapter implementing [`Objective`].
#[derive(Debug, Clone)]
pub struct ObjectiveFn<F> {
    f: F,
    dim: Option<usize>,
}

impl<F> ObjectiveFn<F> {
    pub fn new(f: F) -> Self {
        Self { f, dim: None }
    }

    /// Declare the expected number of variables.
    pub fn with_dim(f: F, dim: usize) -> Self {
        Self { f, dim: Some(dim) }
    }
}

impl<S, F> Objective<S> for ObjectiveFn<F>
where
    F: Fn(&Point<S>) -> f64,
{
    fn value(&self, z: &Point<S>) -> f64 {
        (self.f)(z)
    }

    fn dim(&self) -> Option<usize> {
        self.dim
    }
}

/// Closure adapter implementing [`Metric`].
#[derive(Debug, Clone)]
pub struct MetricFn<F> {
    f: F,
    dim: Option<usize>,
}

impl<F> MetricFn<F> {
    pub fn new(f: F) -> Self {
        Self { f, dim: None }
    }

    pub fn with_dim(f: F, dim: usize) -> Self {
        Self { f, dim: Some(dim) }
    }
}

impl<S, F> Metric<S> for MetricFn<F>
where
    F: Fn(&Point<S>, &Point<S>) -> f64,
{
    fn value(&self, z1: &Point<S>, z2: &Point<S>) -> f64 {
        (self.f)(z1, z2)
    }

    fn dim(&self) -> Option<usize> {
        self.dim
    }
}

/// Optimization direction.
///
/// Parsing accepts (case-insensitive) `"minimize"`/`"min"` and
/// `"maximize"`/`"max"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    /// `-1.0` for minimization, `+1.0` for maximization.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Minimize => -1.0,
            Direction::Maximize => 1.0,
        }
    }

    /// Map a numeric sign onto a direction.
    ///
    /// # Errors
    /// Returns [`OptError::InvalidSign`] unless `sign` is exactly `-1.0` or `+1.0`.
    pub fn from_sign(sign: f64) -> OptResult<Self> {
        if sign == -1.0 {
            Ok(Direction::Minimize)
        } else if sign == 1.0 {
            Ok(Direction::Maximize)
        } else {
            Err(OptError::InvalidSign { sign })
        }
    }
}

impl FromStr for Direction {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimize" | "min" => Ok(Direction::Minimize),
            "maximize" | "max" => Ok(Direction::Maximize),
            _ => Err(OptError::InvalidDirection {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'minimize' or 'maximize'.",
            }),
        }
    }
}

/// Configuration shared by every SPSA-family entry point.
///
/// Fields:
/// - `gains`: `{a, b, A, s, t}`; defaults to [`crate::optimization::spsa::DEFAULT_GAINS`].
/// - `direction`: minimize (sign −1, default) or maximize (sign +1).
/// - `calibration_samples`: `Ncalibrate`; `0` (default) disables calibration.
/// - `hessian_delay`: first-order warmup iterations before curvature is
///   accumulated (second-order and natural variants only). Default `0`.
/// - `initial_iteration`: gain index of the first iteration. Default `1`.
/// - `constant_learning_rate`: pin the gains to the first iteration's
///   values. Default `false`.
/// - `regularization`: eigenvalue repair of the curvature estimate. Default
///   `MatrixModulus { shift: 1.0 }`.
/// - `preconditioner`: full matrix or scalar `(tr H / N)·I`.
/// - `curvature_seed`: the curvature estimate starts at `curvature_seed · I`
///   and that seed counts as one sample of the running mean. Default `0.0`
///   (zero matrix).
/// - `seed`: seed for the perturbation generator; `None` draws from OS
///   entropy.
///
/// Build with `SpsaOptions::default()` and the chainable `with_*` setters.
/// Values are checked by [`SpsaOptions::validate`] at the start of every
/// run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpsaOptions {
    pub gains: Gains,
    pub direction: Direction,
    pub calibration_samples: usize,
    pub hessian_delay: usize,
    pub initial_iteration: usize,
    pub constant_learning_rate: bool,
    pub regularization: Regularization,
    pub preconditioner: Preconditioner,
    pub curvature_seed: f64,
    pub seed: Option<u64>,
}

impl Default for SpsaOptions {
    fn default() -> Self {
        Self {
            gains: Gains::default(),
            direction: Direction::Minimize,
            calibration_samples: 0,
            hessian_delay: 0,
            initial_iteration: 1,
            constant_learning_rate: false,
            regularization: Regularization::default(),
            preconditioner: Preconditioner::Full,
            curvature_seed: 0.0,
            seed: None,
        }
    }
}

impl SpsaOptions {
    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_calibration_samples(mut self, samples: usize) -> Self {
        self.calibration_samples = samples;
        self
    }

    pub fn with_hessian_delay(mut self, delay: usize) -> Self {
        self.hessian_delay = delay;
        self
    }

    pub fn with_initial_iteration(mut self, k: usize) -> Self {
        self.initial_iteration = k;
        self
    }

    pub fn with_constant_learning_rate(mut self, constant: bool) -> Self {
        self.constant_learning_rate = constant;
        self
    }

    pub fn with_regularization(mut self, regularization: Regularization) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_preconditioner(mut self, preconditioner: Preconditioner) -> Self {
        self.preconditioner = preconditioner;
        self
    }

    pub fn with_curvature_seed(mut self, seed: f64) -> Self {
        self.curvature_seed = seed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Optimization sign implied by `direction`.
    pub fn sign(&self) -> f64 {
        self.direction.sign()
    }

    /// Check option values that would make a run meaningless.
    ///
    /// Gains are not checked; out-of-range gains only change the decay
    /// behavior, which shows in the trajectory.
    ///
    /// # Errors
    /// - [`OptError::InvalidRegularization`] for a negative or non-finite constant.
    /// - [`OptError::InvalidCurvatureSeed`] for a non-finite seed.
    pub fn validate(&self) -> OptResult<()> {
        self.regularization.validate()?;
        if !self.curvature_seed.is_finite() {
            return Err(OptError::InvalidCurvatureSeed {
                value: self.curvature_seed,
                reason: "Curvature seed must be finite.",
            });
        }
        Ok(())
    }
}

/// Update rule family of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    FirstOrder,
    SecondOrder,
    Natural,
    NaturalScalar,
    Lbfgs,
}

/// How a variant treats the variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableDomain {
    /// Real variables, real perturbations.
    Real,
    /// Complex variables, fourth-root-of-unity perturbations.
    Complex,
    /// Complex variables optimized as `2N` reals through the bridge.
    ComplexAsReal,
}

/// Named optimizer variants.
///
/// Parsing is case-insensitive on the canonical names returned by
/// [`Algorithm::name`] (e.g. `"cspsa_qn_scalar"`, `"SPSA2_on_complex"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Spsa,
    Spsa2,
    SpsaQn,
    Cspsa,
    Cspsa2,
    CspsaQn,
    CspsaQnScalar,
    SpsaOnComplex,
    Spsa2OnComplex,
    SpsaQnOnComplex,
    SpsaQnScalarOnComplex,
    LbfgsOnComplex,
}

impl Algorithm {
    pub const ALL: [Algorithm; 12] = [
        Algorithm::Spsa,
        Algorithm::Spsa2,
        Algorithm::SpsaQn,
        Algorithm::Cspsa,
        Algorithm::Cspsa2,
        Algorithm::CspsaQn,
        Algorithm::CspsaQnScalar,
        Algorithm::SpsaOnComplex,
        Algorithm::Spsa2OnComplex,
        Algorithm::SpsaQnOnComplex,
        Algorithm::SpsaQnScalarOnComplex,
        Algorithm::LbfgsOnComplex,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Spsa => "SPSA",
            Algorithm::Spsa2 => "SPSA2",
            Algorithm::SpsaQn => "SPSA_QN",
            Algorithm::Cspsa => "CSPSA",
            Algorithm::Cspsa2 => "CSPSA2",
            Algorithm::CspsaQn => "CSPSA_QN",
            Algorithm::CspsaQnScalar => "CSPSA_QN_scalar",
            Algorithm::SpsaOnComplex => "SPSA_on_complex",
            Algorithm::Spsa2OnComplex => "SPSA2_on_complex",
            Algorithm::SpsaQnOnComplex => "SPSA_QN_on_complex",
            Algorithm::SpsaQnScalarOnComplex => "SPSA_QN_scalar_on_complex",
            Algorithm::LbfgsOnComplex => "LBFGS_on_complex",
        }
    }

    pub fn kind(self) -> AlgorithmKind {
        match self {
            Algorithm::Spsa | Algorithm::Cspsa | Algorithm::SpsaOnComplex => {
                AlgorithmKind::FirstOrder
            }
            Algorithm::Spsa2 | Algorithm::Cspsa2 | Algorithm::Spsa2OnComplex => {
                AlgorithmKind::SecondOrder
            }
            Algorithm::SpsaQn | Algorithm::CspsaQn | Algorithm::SpsaQnOnComplex => {
                AlgorithmKind::Natural
            }
            Algorithm::CspsaQnScalar | Algorithm::SpsaQnScalarOnComplex => {
                AlgorithmKind::NaturalScalar
            }
            Algorithm::LbfgsOnComplex => AlgorithmKind::Lbfgs,
        }
    }

    pub fn domain(self) -> VariableDomain {
        match self {
            Algorithm::Spsa | Algorithm::Spsa2 | Algorithm::SpsaQn => VariableDomain::Real,
            Algorithm::Cspsa | Algorithm::Cspsa2 | Algorithm::CspsaQn | Algorithm::CspsaQnScalar => {
                VariableDomain::Complex
            }
            _ => VariableDomain::ComplexAsReal,
        }
    }

    /// Whether the variant needs a metric function.
    pub fn needs_metric(self) -> bool {
        matches!(self.kind(), AlgorithmKind::Natural | AlgorithmKind::NaturalScalar)
    }
}

impl FromStr for Algorithm {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Algorithm::ALL.into_iter().find(|alg| alg.name().to_lowercase() == wanted).ok_or_else(|| {
            OptError::InvalidAlgorithm {
                name: s.to_string(),
                reason: "Unknown algorithm; expected one of SPSA, SPSA2, SPSA_QN, CSPSA, CSPSA2, \
                         CSPSA_QN, CSPSA_QN_scalar, or an *_on_complex variant.",
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Direction sign mapping and parsing.
    // - SpsaOptions defaults, setters and validation.
    // - Algorithm tagging and name round-trips.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Signs map onto directions and back; other values are rejected.
    //
    // Given
    // -----
    // - Signs -1, +1 and 0.5.
    //
    // Expect
    // ------
    // - Minimize/Maximize for ±1, `InvalidSign` for 0.5.
    fn direction_maps_signs() {
        assert_eq!(Direction::from_sign(-1.0), Ok(Direction::Minimize));
        assert_eq!(Direction::from_sign(1.0), Ok(Direction::Maximize));
        assert_eq!(Direction::from_sign(0.5), Err(OptError::InvalidSign { sign: 0.5 }));
        assert_eq!(Direction::Maximize.sign(), 1.0);
        assert_eq!("MAX".parse::<Direction>(), Ok(Direction::Maximize));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    // Purpose
    // -------
    // Defaults match the documented values and setters chain.
    //
    // Given
    // -----
    // - `SpsaOptions::default()` with a few overrides.
    //
    // Expect
    // ------
    // - Defaults: sign −1, no calibration, no delay, k₀ = 1, zero seed.
    // - Overrides are applied and the result validates.
    fn options_defaults_and_setters() {
        // Arrange
        let defaults = SpsaOptions::default();

        // Act
        let opts = SpsaOptions::default().with_hessian_delay(10).with_seed(42).with_curvature_seed(1.0);

        // Assert
        assert_eq!(defaults.sign(), -1.0);
        assert_eq!(defaults.calibration_samples, 0);
        assert_eq!(defaults.hessian_delay, 0);
        assert_eq!(defaults.initial_iteration, 1);
        assert!(!defaults.constant_learning_rate);
        assert_eq!(defaults.curvature_seed, 0.0);
        assert_eq!(opts.hessian_delay, 10);
        assert_eq!(opts.seed, Some(42));
        assert!(opts.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Validation rejects a non-finite curvature seed.
    //
    // Given
    // -----
    // - `curvature_seed = ∞`.
    //
    // Expect
    // ------
    // - `InvalidCurvatureSeed`.
    fn options_reject_non_finite_curvature_seed() {
        let opts = SpsaOptions::default().with_curvature_seed(f64::INFINITY);
        assert!(matches!(opts.validate(), Err(OptError::InvalidCurvatureSeed { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Every variant parses back from its canonical name, ignoring case.
    //
    // Given
    // -----
    // - `Algorithm::ALL`.
    //
    // Expect
    // ------
    // - `name().to_uppercase().parse()` yields the same variant.
    // - Unknown names are rejected.
    fn algorithm_names_round_trip() {
        for alg in Algorithm::ALL {
            let parsed: Algorithm = alg.name().to_uppercase().parse().expect("canonical name parses");
            assert_eq!(parsed, alg);
        }
        assert!(matches!("adam".parse::<Algorithm>(), Err(OptError::InvalidAlgorithm { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Kind and domain tags follow the variant table.
    //
    // Given
    // -----
    // - A sample of variants.
    //
    // Expect
    // ------
    // - Tags and metric requirements match the naming.
    fn algorithm_tags_match_variant_table() {
        assert_eq!(Algorithm::Cspsa2.kind(), AlgorithmKind::SecondOrder);
        assert_eq!(Algorithm::Cspsa2.domain(), VariableDomain::Complex);
        assert_eq!(Algorithm::SpsaQnScalarOnComplex.kind(), AlgorithmKind::NaturalScalar);
        assert_eq!(Algorithm::SpsaQnScalarOnComplex.domain(), VariableDomain::ComplexAsReal);
        assert_eq!(Algorithm::Spsa.domain(), VariableDomain::Real);
        assert_eq!(Algorithm::LbfgsOnComplex.kind(), AlgorithmKind::Lbfgs);
        assert!(Algorithm::CspsaQn.needs_metric());
        assert!(!Algorithm::Spsa2OnComplex.needs_metric());
    }
}
