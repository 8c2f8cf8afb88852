//! Bridge from [`Objective`] to argmin's `CostFunction` and `Gradient`.
//!
//! The cost is the objective value itself (a loss, minimized as is). When
//! the objective has no analytic gradient, the gradient is a central finite
//! difference of the cost, with a forward-difference retry if any cost
//! evaluation failed or the central result is not finite.
//!
//! A central-difference gradient costs `2 · dim(θ)` objective evaluations.
//! With the standard surface architecture θ has about 2·10⁵ entries, so
//! finite-difference training is only practical for small networks.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

use crate::training::{
    errors::TrainError,
    objective::Objective,
    types::{Cost, Grad, Theta},
    validation::validate_grad,
};

#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// # Errors
    /// Objective errors, and [`TrainError::NonFiniteCost`] for NaN/±inf.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((TrainError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Analytic gradient if the objective provides one, else finite
    /// differences of [`CostFunction::cost`].
    ///
    /// The finite-difference closure must return `f64`, so the first cost
    /// error is parked in `closure_err` and the closure returns NaN; it is
    /// re-raised after the forward-difference retry.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(TrainError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient of `func` at `theta`, surfacing any captured
/// cost error.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
