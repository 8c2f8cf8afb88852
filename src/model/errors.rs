//! Errors for the BINN models (configuration, shapes, numerical health).
//!
//! This module defines [`BinnError`], the error type returned by model
//! construction and by every forward/loss call, plus the conversions that
//! lift the component errors (network, rate, surface, policy) into it.
//!
//! ## Conventions
//! - **Configuration** problems (missing or invalid parameters, unknown
//!   policy shape, invalid weights) are reported at construction time.
//! - **Shape** problems are reported at the boundary of each evaluate call,
//!   before any arithmetic runs.
//! - **Numerical instability** means a loss term or rate output became
//!   NaN/±inf. The core never retries; the caller decides what to do.
//! - Errors are local to one call; the model is never left half-updated.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};
use thiserror::Error;

use crate::{
    network::errors::NetworkError,
    policy::errors::PolicyError,
    rates::errors::RateError,
    surface::errors::SurfaceError,
};

/// Result alias for model construction and evaluation.
pub type BinnResult<T> = Result<T, BinnError>;

/// Unified error type for the BINN models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BinnError {
    // ---- Configuration ----
    /// Missing or invalid model parameter / configuration entry.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Policy-curve identifier is not recognized.
    #[error(
        "Unknown policy curve shape '{name}'. Valid options are 'linear', 'sin', 'piecewise' or 'constant'."
    )]
    UnknownPolicyShape { name: String },

    // ---- Numerical health ----
    /// A loss term or rate output is NaN/±inf.
    #[error("Numerical instability in {term}: value {value}")]
    NumericalInstability { term: &'static str, value: f64 },

    // ---- Shapes ----
    /// Batch dimensionality inconsistent with the declared size.
    #[error("Shape mismatch in {context}: expected {expected}, found {found}.")]
    ShapeMismatch { context: &'static str, expected: usize, found: usize },

    // ---- Denoised table lookups ----
    /// A time sample does not round to a day inside the table.
    #[error("Time {value} at index {index} is outside the table's day range [{min}, {max}].")]
    TimeOutOfRange { index: usize, value: f64, min: f64, max: f64 },

    /// Table construction failed.
    #[error("Invalid derivative table: {reason}")]
    InvalidDerivativeTable { reason: String },

    // ---- Observations ----
    /// Observed data failed validation.
    #[error("Invalid observations: {reason}")]
    InvalidObservations { reason: String },

    // ---- Wrapped component errors ----
    #[error(transparent)]
    Network(NetworkError),

    #[error(transparent)]
    Rate(RateError),

    #[error(transparent)]
    Surface(SurfaceError),

    #[error(transparent)]
    Policy(PolicyError),
}

impl From<NetworkError> for BinnError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::InputWidthMismatch { expected, found } => {
                BinnError::ShapeMismatch { context: "network input", expected, found }
            }
            NetworkError::ParameterLengthMismatch { expected, found } => {
                BinnError::ShapeMismatch { context: "parameter vector", expected, found }
            }
            other => BinnError::Network(other),
        }
    }
}

impl From<RateError> for BinnError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::NonFiniteRate { kind, value, .. } => {
                BinnError::NumericalInstability { term: kind.term(), value }
            }
            RateError::InputWidthMismatch { expected, found, .. } => {
                BinnError::ShapeMismatch { context: "rate input", expected, found }
            }
            RateError::Network(inner) => BinnError::from(inner),
            invalid @ RateError::InvalidBounds { .. } => {
                BinnError::Configuration { reason: invalid.to_string() }
            }
            other => BinnError::Rate(other),
        }
    }
}

impl From<SurfaceError> for BinnError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::Network(inner) => BinnError::from(inner),
            other => BinnError::Surface(other),
        }
    }
}

impl From<PolicyError> for BinnError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::UnknownShape { name } => BinnError::UnknownPolicyShape { name },
            PolicyError::NonFiniteTime { value, .. } => {
                BinnError::NumericalInstability { term: "policy curve time", value }
            }
            other => BinnError::Policy(other),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<BinnError> for PyErr {
    fn from(err: BinnError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateKind;

    #[test]
    // Purpose
    // -------
    // Component errors lift into the model taxonomy.
    //
    // Given
    // -----
    // A non-finite rate, a rate width mismatch, an unknown policy shape.
    //
    // Expect
    // ------
    // `NumericalInstability`, `ShapeMismatch`, `UnknownPolicyShape`.
    fn component_errors_map_into_taxonomy() {
        let nan = BinnError::from(RateError::NonFiniteRate {
            kind: RateKind::Diagnosis,
            index: 3,
            value: f64::INFINITY,
        });
        assert_eq!(
            nan,
            BinnError::NumericalInstability { term: "diagnosis rate", value: f64::INFINITY }
        );

        let width = BinnError::from(RateError::InputWidthMismatch {
            kind: RateKind::Contact,
            expected: 3,
            found: 2,
        });
        assert_eq!(width, BinnError::ShapeMismatch { context: "rate input", expected: 3, found: 2 });

        let shape = BinnError::from(PolicyError::UnknownShape { name: "step".into() });
        assert_eq!(shape, BinnError::UnknownPolicyShape { name: "step".into() });
    }
}
