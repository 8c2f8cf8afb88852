//! BINN models: parameters, ODE tables, losses and the two model families.
//!
//! - `parameters`, `weights`, `config`: construction inputs.
//! - `compartments`: ODE right-hand side tables and structural variants.
//! - `physics`: rate networks and the physics residual.
//! - `loss`: GLS data loss and loss breakdown.
//! - `surface_binn`, `denoised_binn`: the two [`DifferentialModel`] families.
//! - `builder`: variant selection.
pub mod builder;
pub mod compartments;
pub mod config;
pub mod data;
pub mod denoised_binn;
pub mod errors;
pub mod guards;
pub mod loss;
pub mod parameters;
pub mod physics;
pub mod surface_binn;
pub mod table;
pub mod traits;
pub mod weights;

pub use builder::{build_denoised_model, build_model};
pub use compartments::{Compartment, CompartmentVariant, FoldDiagnosed, KeepDiagnosed};
pub use config::{BinnConfig, NetworkArchitecture};
pub use data::{ForwardPass, Observations};
pub use denoised_binn::DenoisedBinn;
pub use errors::{BinnError, BinnResult};
pub use loss::LossBreakdown;
pub use parameters::ModelParameters;
pub use physics::{MonotonicityPenalties, PhysicsResidual, RateNetworks};
pub use surface_binn::SurfaceBinn;
pub use table::PrecomputedDerivativeTable;
pub use traits::DifferentialModel;
pub use weights::LossWeights;
