//! Errors for the training loop (options, gradients, solver backend).
//!
//! [`TrainError`] covers invalid [`TrainOptions`](super::options::TrainOptions),
//! gradient/parameter validation failures, non-finite losses, errors raised
//! inside the argmin executor, and model errors lifted from [`BinnError`].
//!
//! ## Conversions
//! - `BinnError` / `NetworkError` → [`TrainError::Model`].
//! - `argmin::core::Error` → first downcast back to a [`TrainError`] (errors
//!   raised by our own cost function travel through argmin boxed), then to
//!   `ArgminError`, else [`TrainError::BackendError`] with the message.
use argmin::core::{ArgminError, Error as ArgminFailure};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, PyErr};
use thiserror::Error;

use crate::{model::errors::BinnError, network::errors::NetworkError};

/// Result alias for training operations.
pub type TrainResult<T> = Result<T, TrainError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    // ---- Gradient ----
    /// Signals that finite differences should be used.
    #[error("Gradient optimization not implemented")]
    GradientNotImplemented,

    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- TrainOptions ----
    #[error("Invalid gradient tolerance {tol}: {reason}")]
    InvalidTolGrad { tol: f64, reason: &'static str },

    #[error("Invalid cost function change tolerance {tol}: {reason}")]
    InvalidTolCost { tol: f64, reason: &'static str },

    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// At least one stopping rule must be provided.
    #[error("No tolerances provided")]
    NoTolerancesProvided,

    #[error("Invalid line searcher '{name}': {reason}")]
    InvalidLineSearch { name: String, reason: &'static str },

    #[error("Invalid L-BFGS memory {mem}: {reason}")]
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    #[error("Invalid number of training rounds {rounds}: at least one round is required")]
    InvalidRounds { rounds: usize },

    // ---- Objective ----
    #[error("Non-finite cost value: {value}")]
    NonFiniteCost { value: f64 },

    #[error("Parameter vector length mismatch: expected {expected}, found {found}")]
    ThetaLengthMismatch { expected: usize, found: usize },

    #[error("Invalid parameter at index {index}: {value}: {reason}")]
    InvalidThetaInput { index: usize, value: f64, reason: &'static str },

    #[error("Collocation batch is empty")]
    EmptyCollocation,

    // ---- Solver outcome ----
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    // ---- Argmin ----
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },

    #[error("Not implemented: {text}")]
    NotImplemented { text: String },

    #[error("Not initialized: {text}")]
    NotInitialized { text: String },

    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },

    #[error("Checkpoint not found: {text}")]
    CheckPointNotFound { text: String },

    #[error("Potential bug: {text}")]
    PotentialBug { text: String },

    #[error("Impossible error: {text}")]
    ImpossibleError { text: String },

    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Model ----
    #[error(transparent)]
    Model(#[from] BinnError),

    // ---- Fallback ----
    #[error("Unknown error")]
    UnknownError,
}

impl From<NetworkError> for TrainError {
    fn from(err: NetworkError) -> Self {
        TrainError::Model(BinnError::from(err))
    }
}

impl From<ArgminFailure> for TrainError {
    fn from(original_err: ArgminFailure) -> Self {
        let original_err = match original_err.downcast::<TrainError>() {
            Ok(train_err) => return train_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => TrainError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => TrainError::NotImplemented { text },
                ArgminError::NotInitialized { text } => TrainError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => TrainError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => {
                    TrainError::CheckPointNotFound { text }
                }
                ArgminError::PotentialBug { text } => TrainError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => TrainError::ImpossibleError { text },
                _ => TrainError::UnknownError,
            },
            Err(err) => TrainError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<TrainError> for PyErr {
    fn from(err: TrainError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
