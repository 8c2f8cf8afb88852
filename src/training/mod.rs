//! training — argmin-powered L-BFGS training for BINN models.
//!
//! Purpose
//! -------
//! Fit every network inside a [`DifferentialModel`](crate::model::DifferentialModel)
//! by minimizing its total loss over the flattened parameter vector.
//!
//! Key behaviors
//! -------------
//! - [`Objective`] is the generic loss interface; [`ModelObjective`]
//!   implements it for any boxed model against a frozen [`TrainingBatch`].
//! - [`adapter::ArgMinAdapter`] bridges an objective into argmin. Gradients
//!   are central finite differences with a forward-difference fallback
//!   unless the objective supplies an analytic one.
//! - [`minimize`] runs a single L-BFGS round; [`fit`] runs
//!   `TrainOptions::rounds` of them, resampling collocation points each round.
//!
//! Conventions
//! -----------
//! - The cost is the loss itself; no sign flip.
//! - Errors bubble up as [`TrainResult`] / [`TrainError`]; model errors stay
//!   recognizable as [`TrainError::Model`].
//!
//! Testing notes
//! -------------
//! - Convex toy objectives exercise the adapter, builders and runner; tiny
//!   networks exercise `fit` end to end.
pub mod adapter;
pub mod api;
pub mod builders;
pub mod errors;
pub mod fit;
pub mod objective;
pub mod options;
pub mod run;
pub mod types;
pub mod validation;

pub use api::minimize;
pub use errors::{TrainError, TrainResult};
pub use fit::{fit, RoundOutcome, TrainOutcome};
pub use objective::{ModelObjective, Objective, TrainingBatch};
pub use options::{LineSearcher, Tolerances, TrainOptions};
pub use run::LbfgsOutcome;
pub use types::{Cost, Grad, Theta, DEFAULT_LBFGS_MEM};
