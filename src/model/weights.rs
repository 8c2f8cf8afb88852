//! Fixed loss coefficients.
//!
//! Purpose
//! -------
//! Collect every scalar that balances the terms of the composite loss, with
//! the defaults the models were tuned with, and validate them against the
//! structural variant.
//!
//! Key behaviors
//! -------------
//! - [`LossWeights::for_variant`] returns the defaults with the variant's
//!   per-compartment magnitude weights (1000× on the small compartments).
//! - [`LossWeights::validate`] requires finite nonnegative entries and a
//!   compartment weight vector whose length matches the variant.
//!
//! Conventions
//! -----------
//! - Total loss: `surface_weight · data + pde_weight · physics`, where
//!   `physics = mean(pde_loss_weight · Σ_checked w_c · r_c² + penalties)`.
//! - Weights are fixed at construction; training only changes networks.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::model::{
    compartments::CompartmentVariant,
    errors::{BinnError, BinnResult},
};

/// Coefficients of the composite loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossWeights {
    /// Emphasis on rows at the initial time.
    pub ic_weight: f64,
    /// Multiplier of the data (GLS) loss.
    pub surface_weight: f64,
    /// Multiplier of the physics loss.
    pub pde_weight: f64,
    /// Multiplier of the summed squared ODE residuals inside the physics loss.
    pub pde_loss_weight: f64,
    /// Penalty weight on negative `∂(yita·(A+Y))/∂A` and `∂(yita·(A+Y))/∂Y`.
    pub contact_monotonicity_weight: f64,
    /// Penalty weight on negative `∂tau/∂A` and `∂tau/∂Y`.
    pub diagnosis_monotonicity_weight: f64,
    /// Exponent of the adaptive GLS weight `max(|u|, 1)^(−gls_gamma)`.
    pub gls_gamma: f64,
    /// Per-compartment magnitude weights for the data loss.
    pub compartment_weights: Vec<f64>,
    /// Per-compartment weights on the squared ODE residuals.
    pub residual_weights: Vec<f64>,
}

impl LossWeights {
    pub fn for_variant<V: CompartmentVariant>() -> Self {
        LossWeights {
            ic_weight: 1e1,
            surface_weight: 1e2,
            pde_weight: 1e4,
            pde_loss_weight: 1.0,
            contact_monotonicity_weight: 1e5,
            diagnosis_monotonicity_weight: 1e5,
            gls_gamma: 0.2,
            compartment_weights: V::default_compartment_weights().to_vec(),
            residual_weights: vec![1.0; V::N_COMPARTMENTS],
        }
    }

    pub fn with_pde_weight(mut self, pde_weight: f64) -> Self {
        self.pde_weight = pde_weight;
        self
    }

    pub fn compartment_weights(&self) -> Array1<f64> {
        Array1::from(self.compartment_weights.clone())
    }

    /// # Errors
    /// [`BinnError::Configuration`] for non-finite or negative coefficients,
    /// or a weight vector whose length is not `n_compartments`.
    pub fn validate(&self, n_compartments: usize) -> BinnResult<()> {
        let scalars = [
            ("ic_weight", self.ic_weight),
            ("surface_weight", self.surface_weight),
            ("pde_weight", self.pde_weight),
            ("pde_loss_weight", self.pde_loss_weight),
            ("contact_monotonicity_weight", self.contact_monotonicity_weight),
            ("diagnosis_monotonicity_weight", self.diagnosis_monotonicity_weight),
            ("gls_gamma", self.gls_gamma),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(BinnError::Configuration {
                    reason: format!("loss weight '{name}' must be finite and >= 0, got {value}"),
                });
            }
        }
        for (name, vector) in
            [("compartment_weights", &self.compartment_weights), ("residual_weights", &self.residual_weights)]
        {
            if vector.len() != n_compartments {
                return Err(BinnError::Configuration {
                    reason: format!(
                        "{name} has length {}, expected {n_compartments}",
                        vector.len()
                    ),
                });
            }
            if let Some((i, v)) = vector.iter().enumerate().find(|(_, v)| !v.is_finite() || **v < 0.0) {
                return Err(BinnError::Configuration {
                    reason: format!("{name}[{i}] must be finite and >= 0, got {v}"),
                });
            }
        }
        Ok(())
    }
}
