//! Errors for the surface fitter.
use thiserror::Error;

use crate::network::errors::NetworkError;

pub type SurfaceResult<T> = Result<T, SurfaceError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// A time sample is NaN/±inf.
    #[error("Surface time sample at index {index} is non-finite: {value}")]
    NonFiniteTime { index: usize, value: f64 },

    /// Time batch has no samples.
    #[error("Surface time batch is empty.")]
    EmptyBatch,

    /// Wrapped network does not take a single time input.
    #[error("Surface network must take 1 input, found {found}.")]
    InputWidth { found: usize },

    /// Wrapped network must have at least two outputs (compartments).
    #[error("Surface network must produce at least 2 compartments, found {found}.")]
    TooFewCompartments { found: usize },

    /// Wrapped network does not end in a row-normalizing transform.
    #[error("Surface network must end in a softmax output.")]
    NotNormalized,

    #[error(transparent)]
    Network(#[from] NetworkError),
}
