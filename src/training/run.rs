//! Executor wiring shared by both line-search variants.
#[cfg(feature = "obs_slog")]
use argmin::core::Gradient;
use argmin::core::{CostFunction, Executor, State, TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;

use crate::training::{
    adapter::ArgMinAdapter,
    errors::TrainResult,
    objective::Objective,
    options::TrainOptions,
    types::{FnEvalMap, Grad, Theta},
    validation::{validate_theta_hat, validate_value},
};

/// Result of one L-BFGS run.
///
/// - `theta_hat`: best parameters seen, including the starting point.
/// - `initial_loss` / `loss`: objective at the start and at `theta_hat`.
/// - `converged`: the solver met a tolerance (not just the iteration cap).
/// - `status`: argmin's termination status, formatted.
/// - `grad_norm`: norm of the last gradient, when available.
#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsOutcome {
    pub theta_hat: Theta,
    pub initial_loss: f64,
    pub loss: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl LbfgsOutcome {
    /// # Errors
    /// Missing or non-finite `theta_hat`, or a non-finite loss.
    pub fn new(
        theta_hat_opt: Option<Theta>, initial_loss: f64, loss: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> TrainResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(loss)?;
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            other => format!("{other:?}"),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            initial_loss,
            loss,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

/// Run `solver` on `problem` from `theta0`.
///
/// With the `obs_slog` feature and `opts.verbose`, a terminal slog observer
/// is attached and the starting loss is printed before the first iteration.
///
/// # Errors
/// Objective errors raised inside the executor (recovered through
/// `From<argmin::core::Error>`), and outcome validation errors.
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &TrainOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> TrainResult<LbfgsOutcome>
where
    F: Objective,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let initial_loss = problem.cost(&theta0)?;
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(initial_loss, &theta0, &problem);
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    LbfgsOutcome::new(
        result.take_best_param(),
        initial_loss,
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F: Objective>(initial_loss: f64, theta0: &Theta, problem: &ArgMinAdapter<'_, F>) {
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    eprintln!(
        "init: loss(theta0) = {:.6}{}",
        initial_loss,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::{
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        errors::TrainResult,
        options::{LineSearcher, Tolerances},
        types::Cost,
    };
    use ndarray::array;

    // Convex bowl `Σ w_i (θ_i - 1)²`, finite-difference gradients only.
    struct WeightedBowl;

    impl Objective for WeightedBowl {
        type Data = Theta;

        fn value(&self, theta: &Theta, weights: &Theta) -> TrainResult<Cost> {
            Ok((theta - 1.0).mapv(|d| d * d).dot(weights))
        }

        fn check(&self, _theta: &Theta, _weights: &Theta) -> TrainResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches drive a convex bowl to its minimum.
    //
    // Given
    // -----
    // Weights (1, 10), start (-1, 3), max 100 iterations.
    //
    // Expect
    // ------
    // θ̂ ≈ (1, 1), loss ≈ 0, loss below the initial loss.
    fn lbfgs_minimizes_convex_bowl() {
        // Arrange
        let weights = array![1.0, 10.0];
        let tols = Tolerances::new(Some(1e-8), None, Some(100)).unwrap();
        for searcher in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = TrainOptions::new(tols, searcher, None, 1, 0, false).unwrap();
            let problem = ArgMinAdapter::new(&WeightedBowl, &weights);
            let theta0 = array![-1.0, 3.0];

            // Act
            let out = match searcher {
                LineSearcher::MoreThuente => {
                    run_lbfgs(theta0, &opts, problem, build_optimizer_more_thuente(&opts).unwrap())
                }
                LineSearcher::HagerZhang => {
                    run_lbfgs(theta0, &opts, problem, build_optimizer_hager_zhang(&opts).unwrap())
                }
            }
            .unwrap();

            // Assert
            assert!((out.theta_hat[0] - 1.0).abs() < 1e-4);
            assert!((out.theta_hat[1] - 1.0).abs() < 1e-4);
            assert!(out.loss < 1e-6);
            assert!((out.initial_loss - 44.0).abs() < 1e-12);
            assert!(out.iterations > 0);
        }
    }
}
