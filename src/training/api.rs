//! Single-round entry point: minimize an [`Objective`] with L-BFGS.
use crate::training::{
    adapter::ArgMinAdapter,
    builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
    errors::TrainResult,
    objective::Objective,
    options::{LineSearcher, TrainOptions},
    run::{run_lbfgs, LbfgsOutcome},
    types::Theta,
};

/// Minimize `f(θ; data)` from `theta0`.
///
/// Calls [`Objective::check`] once, builds the L-BFGS solver for
/// `opts.line_searcher` and runs it. Gradients come from
/// [`Objective::grad`] or, by default, finite differences.
///
/// # Errors
/// Check failures, solver configuration errors, and any objective error
/// raised during the run.
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &TrainOptions,
) -> TrainResult<LbfgsOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
