//! Validation helpers for training options, parameters and gradients.
use crate::training::{
    errors::{TrainError, TrainResult},
    types::{Grad, Theta},
};

/// Validate the optional gradient-norm tolerance.
///
/// `None` disables the rule; `Some` must be finite and strictly positive.
///
/// # Errors
/// [`TrainError::InvalidTolGrad`].
pub fn verify_tol_grad(tol: Option<f64>) -> TrainResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(TrainError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(TrainError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance.
///
/// # Errors
/// [`TrainError::InvalidTolCost`].
pub fn verify_tol_cost(tol: Option<f64>) -> TrainResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(TrainError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(TrainError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Check a gradient's length against `dim` and that every entry is finite.
///
/// # Errors
/// - [`TrainError::GradientDimMismatch`] on length mismatch.
/// - [`TrainError::InvalidGradient`] at the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> TrainResult<()> {
    if grad.len() != dim {
        return Err(TrainError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(TrainError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Check a starting parameter vector before optimization.
///
/// # Errors
/// - [`TrainError::ThetaLengthMismatch`] when `theta.len() != dim`.
/// - [`TrainError::InvalidThetaInput`] at the first non-finite entry.
pub fn validate_theta(theta: &Theta, dim: usize) -> TrainResult<()> {
    if theta.len() != dim {
        return Err(TrainError::ThetaLengthMismatch { expected: dim, found: theta.len() });
    }
    match theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(TrainError::InvalidThetaInput {
            index,
            value,
            reason: "Initial parameters must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best parameters, rejecting missing or non-finite ones.
///
/// # Errors
/// - [`TrainError::MissingThetaHat`] if the solver produced none.
/// - [`TrainError::InvalidThetaHat`] at the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> TrainResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(TrainError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(TrainError::MissingThetaHat),
    }
}

/// # Errors
/// [`TrainError::NonFiniteCost`] for NaN/±inf.
pub fn validate_value(value: f64) -> TrainResult<()> {
    if !value.is_finite() {
        return Err(TrainError::NonFiniteCost { value });
    }
    Ok(())
}
