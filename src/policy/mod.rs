//! Policy curve (`chi`): analytic intervention strength over time.
pub mod curve;
pub mod errors;

pub use curve::PolicyCurve;
pub use errors::{PolicyError, PolicyResult};
