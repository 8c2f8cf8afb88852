//! Surrogate surface `u(t)` over all compartments.
pub mod errors;
pub mod fitter;

pub use errors::{SurfaceError, SurfaceResult};
pub use fitter::SurfaceFitter;
