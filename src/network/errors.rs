//! Errors for the feed-forward network layer (construction, evaluation and
//! exact derivatives).
//!
//! ## Conventions
//! - **Indices are 0-based**; `row` refers to the batch row, `col` to the
//!   input feature column.
//! - Every evaluation entrypoint validates its input batch before touching
//!   the weights, so a malformed batch never produces a partially computed
//!   output.
use thiserror::Error;

/// Result alias for network construction and evaluation.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Unified error type for [`Mlp`](crate::network::mlp::Mlp) construction,
/// forward evaluation, tangent propagation, and flat parameter access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    // ---- Construction ----
    /// The network needs at least one dense layer.
    #[error("Network must contain at least one layer.")]
    NoLayers,

    /// A requested layer width is zero.
    #[error("Layer width at position {index} must be positive.")]
    ZeroWidth { index: usize },

    /// Consecutive layers do not chain (`fan_out(layer i-1) != fan_in(layer i)`).
    #[error("Layer {index} expects {expected} inputs but the previous layer produces {found}.")]
    LayerChainMismatch { index: usize, expected: usize, found: usize },

    /// A layer's bias length differs from its output width.
    #[error("Bias of layer {index} has length {found}, expected {expected}.")]
    BiasLengthMismatch { index: usize, expected: usize, found: usize },

    // ---- Evaluation ----
    /// Input batch has no rows.
    #[error("Input batch is empty.")]
    EmptyBatch,

    /// Input batch width differs from the declared input size.
    #[error("Input batch has {found} columns, network expects {expected}.")]
    InputWidthMismatch { expected: usize, found: usize },

    /// Input batch contains NaN/±inf.
    #[error("Input batch value at row {row}, column {col} is non-finite: {value}")]
    NonFiniteInput { row: usize, col: usize, value: f64 },

    // ---- Derivatives ----
    /// Derivative requested with respect to a column the input does not have.
    #[error("Derivative column {column} is out of range for {width} input columns.")]
    ColumnOutOfRange { column: usize, width: usize },

    /// Only first-order exact derivatives are provided.
    #[error("Derivative order {order} is not supported; only order 1 is available.")]
    UnsupportedOrder { order: usize },

    // ---- Flat parameters ----
    /// Flat parameter vector length differs from the network's parameter count.
    #[error("Parameter vector has length {found}, expected {expected}.")]
    ParameterLengthMismatch { expected: usize, found: usize },

    /// Flat parameter vector contains NaN/±inf.
    #[error("Parameter at index {index} is non-finite: {value}")]
    NonFiniteParameter { index: usize, value: f64 },

    /// Unknown activation identifier.
    #[error("Unknown activation '{name}'. Valid options are 'relu', 'tanh', 'sigmoid' or 'softplus'.")]
    UnknownActivation { name: String },
}
