//! Learned rate functions: contact (optionally masked), tracing, diagnosis.
pub mod bounds;
pub mod errors;
pub mod function;

pub use bounds::RateBounds;
pub use errors::{RateError, RateResult};
pub use function::{RateFunction, RateKind, RateSensitivity};
