//! L-BFGS solver construction for the two supported line searches.
//!
//! Builders only configure the solver (memory and tolerances). The starting
//! parameters and the iteration cap are applied by
//! [`run_lbfgs`](crate::training::run::run_lbfgs).
use argmin::solver::quasinewton::LBFGS;

use crate::training::{
    errors::TrainResult,
    options::TrainOptions,
    types::{
        Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        DEFAULT_LBFGS_MEM,
    },
};

/// L-BFGS with the Hager–Zhang line search.
///
/// # Errors
/// Tolerances argmin rejects while configuring the solver.
pub fn build_optimizer_hager_zhang(opts: &TrainOptions) -> TrainResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with the More–Thuente line search.
///
/// # Errors
/// Tolerances argmin rejects while configuring the solver.
pub fn build_optimizer_more_thuente(opts: &TrainOptions) -> TrainResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional gradient and cost tolerances. `None` keeps argmin's
/// default.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &TrainOptions,
) -> TrainResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
