//! Configuration surface for the L-BFGS backend.
//!
//! - [`LbfgsOptions`] and [`Tolerances`]: configuration for the solver.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//!
//! Convention: the backend follows the crate-wide optimization sign. Argmin
//! always minimizes, so the adapter hands it the cost `c(x) = −sign · f(x)`;
//! with the default `Direction::Minimize` this is `f` itself.
//!
//! The iteration cap is not part of these options: every run performs at
//! most `niters` iterations, the length of the returned trajectory.
use crate::optimization::{
    errors::{OptError, OptResult},
    lbfgs_backend::validation::{verify_tol_cost, verify_tol_grad},
    spsa::traits::Direction,
};
use std::str::FromStr;

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optional stopping tolerances.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
///
/// Both may be `None`; the iteration budget always bounds the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    pub fn new(tol_grad: Option<f64>, tol_cost: Option<f64>) -> OptResult<Self> {
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        Ok(Self { tol_grad, tol_cost })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: None }
    }
}

/// Solver-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — optional early-stopping tolerances.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `direction: Direction` — minimize (default) or maximize `f`.
/// - `lbfgs_mem: Option<usize>` — history size; `None` uses
///   [`crate::optimization::lbfgs_backend::DEFAULT_LBFGS_MEM`].
/// - `verbose: bool` — if `true`, attaches argmin's slog observer (behind the
///   `obs_slog` feature).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LbfgsOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub direction: Direction,
    pub lbfgs_mem: Option<usize>,
    pub verbose: bool,
}

impl LbfgsOptions {
    /// Create a validated set of solver options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    /// - Tolerance errors from [`Tolerances::new`].
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, direction: Direction,
        lbfgs_mem: Option<usize>, verbose: bool,
    ) -> OptResult<Self> {
        let opts = Self { tols, line_searcher, direction, lbfgs_mem, verbose };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check option values; fields are public and may have been edited.
    ///
    /// # Errors
    /// Same as [`LbfgsOptions::new`].
    pub fn validate(&self) -> OptResult<()> {
        verify_tol_grad(self.tols.tol_grad)?;
        verify_tol_cost(self.tols.tol_cost)?;
        if self.lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(())
    }
}
