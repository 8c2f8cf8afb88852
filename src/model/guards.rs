//! Numerical-health and shape guards shared by the model evaluators.
//!
//! Every loss term passes through [`ensure_finite`] before it is returned,
//! so a NaN/±inf never leaves the model silently. Shape guards produce
//! [`BinnError::ShapeMismatch`] with a short context label.
use ndarray::ArrayView1;
use tracing::warn;

use crate::model::errors::{BinnError, BinnResult};

/// Return `value` if finite, else log and raise `NumericalInstability`.
pub fn ensure_finite(term: &'static str, value: f64) -> BinnResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        warn!(term, value, "numerical instability detected");
        Err(BinnError::NumericalInstability { term, value })
    }
}

/// As [`ensure_finite`], for every entry of `values`.
pub fn ensure_all_finite(term: &'static str, values: ArrayView1<f64>) -> BinnResult<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => ensure_finite(term, value).map(|_| ()),
        None => Ok(()),
    }
}

pub fn ensure_len(context: &'static str, expected: usize, found: usize) -> BinnResult<()> {
    if expected != found {
        return Err(BinnError::ShapeMismatch { context, expected, found });
    }
    Ok(())
}
