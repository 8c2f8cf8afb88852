//! Errors for the policy curve.
use thiserror::Error;

pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The shape identifier is not one of the supported curves.
    #[error(
        "Unknown policy curve shape '{name}'. Valid options are 'linear', 'sin', 'piecewise' or 'constant'."
    )]
    UnknownShape { name: String },

    /// Upper bound must be finite and nonnegative.
    #[error("Policy upper bound must be finite and nonnegative, got {value}.")]
    InvalidUpperBound { value: f64 },

    /// A time sample is NaN/±inf.
    #[error("Policy time at index {index} is non-finite: {value}")]
    NonFiniteTime { index: usize, value: f64 },

    /// The Beta(3, 3) kernel could not be constructed.
    #[error("Beta kernel construction failed: {reason}")]
    Kernel { reason: String },
}
