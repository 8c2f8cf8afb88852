//! Data-fit loss and the per-call loss breakdown.
//!
//! The data loss is a weighted least-squares residual between the surrogate
//! and observed compartment fractions:
//!
//! ```text
//! gls = mean_{r,c} (u_rc − o_rc)² · ic_r · max(|u_rc|, 1)^(−γ) · w_c
//! ic_r = ic_weight if t_r == t_min else 1
//! ```
//!
//! `γ` is `LossWeights::gls_gamma` and `w_c` the compartment weights.
use ndarray::{ArrayView2, Axis};

use crate::model::{
    data::ForwardPass,
    errors::{BinnError, BinnResult},
    guards::{ensure_finite, ensure_len},
    physics::PhysicsResidual,
    weights::LossWeights,
};

/// Terms of one total-loss evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LossBreakdown {
    /// Unweighted data loss (0 for models with a fixed surface).
    pub data: f64,
    /// Physics evaluation, absent when the physics weight is 0.
    pub physics: Option<PhysicsResidual>,
    pub total: f64,
}

/// Generalized least-squares data loss of `pass` against `observed`.
///
/// # Errors
/// - [`BinnError::ShapeMismatch`] for row/column mismatches or a compartment
///   weight vector of the wrong length.
/// - [`BinnError::NumericalInstability`] when the result is not finite.
pub fn gls_loss(
    pass: &ForwardPass, observed: ArrayView2<f64>, weights: &LossWeights, t_min: f64,
) -> BinnResult<f64> {
    let predicted = pass.output();
    ensure_len("observed rows", predicted.nrows(), observed.nrows())?;
    ensure_len("observed columns", predicted.ncols(), observed.ncols())?;
    ensure_len("compartment weights", predicted.ncols(), weights.compartment_weights.len())?;
    if predicted.is_empty() {
        return Err(BinnError::InvalidObservations { reason: "empty batch".to_string() });
    }

    let gamma = weights.gls_gamma;
    let ic = weights.ic_weight;
    let squared = (&predicted - &observed).mapv(|e| e * e);
    let adaptive = predicted.mapv(|u| u.abs().max(1.0).powf(-gamma));
    let emphasis = pass.time().mapv(|t| if t == t_min { ic } else { 1.0 }).insert_axis(Axis(1));
    let weighted = squared * &adaptive * &emphasis * &weights.compartment_weights();

    ensure_finite("data loss", weighted.mean().unwrap_or(0.0))
}
