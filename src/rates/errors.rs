//! Errors for the learned rate functions.
use thiserror::Error;

use crate::{network::errors::NetworkError, rates::function::RateKind};

pub type RateResult<T> = Result<T, RateError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Bounds must be finite with `0 <= lower < upper`.
    #[error("Invalid rate bounds ({lower}, {upper}): {reason}")]
    InvalidBounds { lower: f64, upper: f64, reason: &'static str },

    /// Input slice width differs from what the rate consumes.
    #[error("{kind} rate expects {expected} input columns, got {found}.")]
    InputWidthMismatch { kind: RateKind, expected: usize, found: usize },

    /// Wrapped network does not produce exactly one output.
    #[error("{kind} rate network must have a single output, found {found}.")]
    OutputWidth { kind: RateKind, found: usize },

    /// Wrapped network has no saturating output transform.
    #[error("{kind} rate network must end in a sigmoid output.")]
    UnboundedOutput { kind: RateKind },

    /// Gathered state columns have different lengths.
    #[error("{kind} rate inputs have inconsistent lengths.")]
    RaggedInputs { kind: RateKind },

    /// Rate output is NaN/±inf.
    #[error("{kind} rate output at row {index} is non-finite: {value}")]
    NonFiniteRate { kind: RateKind, index: usize, value: f64 },

    #[error(transparent)]
    Network(#[from] NetworkError),
}
