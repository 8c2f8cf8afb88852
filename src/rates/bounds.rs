//! Affine output bounds for rate functions.
use crate::rates::errors::{RateError, RateResult};

/// Closed range `[lower, upper]` a unit-interval output is rescaled into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBounds {
    lower: f64,
    upper: f64,
}

impl RateBounds {
    /// # Errors
    /// [`RateError::InvalidBounds`] unless both ends are finite and
    /// `0 <= lower < upper`.
    pub fn new(lower: f64, upper: f64) -> RateResult<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(RateError::InvalidBounds { lower, upper, reason: "bounds must be finite" });
        }
        if lower < 0.0 {
            return Err(RateError::InvalidBounds { lower, upper, reason: "lower bound must be >= 0" });
        }
        if lower >= upper {
            return Err(RateError::InvalidBounds {
                lower,
                upper,
                reason: "lower bound must be below upper bound",
            });
        }
        Ok(RateBounds { lower, upper })
    }

    pub(crate) const fn new_unchecked(lower: f64, upper: f64) -> Self {
        RateBounds { lower, upper }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Map `raw ∈ [0, 1]` to `lower + span · raw`.
    pub fn rescale(&self, raw: f64) -> f64 {
        self.lower + self.span() * raw
    }
}
