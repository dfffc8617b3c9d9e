//! lbfgs_backend::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind two builders that return a
//! configured L-BFGS solver for the requested line search.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente line
//!   search.
//! - Apply optional gradient and cost-change tolerances from
//!   [`LbfgsOptions`] via the shared [`configure_lbfgs`].
//!
//! Conventions
//! -----------
//! - The builders do **not** set an initial parameter vector or
//!   `max_iters`; those are applied by `run_lbfgs`.
//! - Errors are reported via [`OptResult`]; `argmin::core::Error` values
//!   are converted at this boundary.
//!
//! Testing notes
//! -------------
//! - Unit tests check both builders with default and explicit memory, and
//!   `configure_lbfgs` with and without tolerances. End-to-end solves are
//!   covered in `api`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    lbfgs_backend::{
        traits::LbfgsOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// Build an [`LbfgsHagerZhang`] solver.
///
/// Uses `opts.lbfgs_mem` (or [`DEFAULT_LBFGS_MEM`]) as history size and
/// applies the optional tolerances.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
/// tolerance.
pub fn build_optimizer_hager_zhang(opts: &LbfgsOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Build an [`LbfgsMoreThuente`] solver.
///
/// # Errors
/// Same as [`build_optimizer_hager_zhang`].
pub fn build_optimizer_more_thuente(opts: &LbfgsOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional tolerances in `opts` to an L-BFGS solver.
///
/// When a tolerance is `None`, the corresponding `with_tolerance_*` method
/// is not called and Argmin's default remains in effect.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
/// tolerance.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &LbfgsOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        lbfgs_backend::traits::{LineSearcher, Tolerances},
        spsa::traits::Direction,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction with both line searches, default and explicit memory.
    // - Application of tolerances via `configure_lbfgs`.
    //
    // They intentionally DO NOT cover:
    // - Executor behavior, which is tested through `lbfgs` in `api`.
    // -------------------------------------------------------------------------

    fn options(line_searcher: LineSearcher, mem: Option<usize>, tols: Tolerances) -> LbfgsOptions {
        LbfgsOptions::new(tols, line_searcher, Direction::Minimize, mem, false)
            .expect("LbfgsOptions should be valid")
    }

    #[test]
    // Purpose
    // -------
    // Both builders succeed with default and explicit memory.
    //
    // Given
    // -----
    // - Valid tolerances; `lbfgs_mem` of `None` and `Some(11)`.
    //
    // Expect
    // ------
    // - All four builds return `Ok(_)`.
    fn builders_accept_default_and_explicit_memory() {
        // Arrange
        let tols = Tolerances::new(Some(1e-6), Some(1e-8)).expect("Tolerances should be valid");

        // Act
        let hz_default = build_optimizer_hager_zhang(&options(LineSearcher::HagerZhang, None, tols));
        let hz_explicit =
            build_optimizer_hager_zhang(&options(LineSearcher::HagerZhang, Some(11), tols));
        let mt_default =
            build_optimizer_more_thuente(&options(LineSearcher::MoreThuente, None, tols));
        let mt_explicit =
            build_optimizer_more_thuente(&options(LineSearcher::MoreThuente, Some(9), tols));

        // Assert
        assert!(hz_default.is_ok());
        assert!(hz_explicit.is_ok());
        assert!(mt_default.is_ok());
        assert!(mt_explicit.is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` succeeds with both tolerances present or both absent.
    //
    // Given
    // -----
    // - A raw L-BFGS solver and options with `(Some, Some)` and `(None, None)`
    //   tolerances.
    //
    // Expect
    // ------
    // - Both calls return `Ok(_)`.
    fn configure_lbfgs_handles_present_and_absent_tolerances() {
        let raw = LBFGS::new(HagerZhangLS::new(), DEFAULT_LBFGS_MEM);
        let both = Tolerances::new(Some(1e-6), Some(1e-8)).expect("Tolerances should be valid");
        assert!(configure_lbfgs(raw, &options(LineSearcher::HagerZhang, None, both)).is_ok());

        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let none = Tolerances::new(None, None).expect("Tolerances should be valid");
        assert!(configure_lbfgs(raw, &options(LineSearcher::MoreThuente, None, none)).is_ok());
    }
}
