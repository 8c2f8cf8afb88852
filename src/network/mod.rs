//! Feed-forward networks used by the surface fitter and the rate functions.
//!
//! - `activations`: hidden and output nonlinearities with tangent maps.
//! - `mlp`: the dense network, exact input derivatives, seeded builder.
//! - `parameters`: flat parameter access shared by all trainable parts.
//! - `errors`: [`NetworkError`].
pub mod activations;
pub mod errors;
pub mod mlp;
pub mod parameters;

pub use activations::{Activation, OutputActivation};
pub use errors::{NetworkError, NetworkResult};
pub use mlp::{DenseLayer, ExactDerivative, Mlp, MlpBuilder, NetworkBuilder, TangentOutput};
pub use parameters::{concatenate_parameters, distribute_parameters, Parameterized};
