//! Construction-time configuration for the BINN models.
//!
//! Purpose
//! -------
//! Bundle every knob a model is built from besides the epidemiological
//! constants: time horizon, variant selector, policy shape, rate bounds,
//! network architecture, loss weights and collocation settings.
//!
//! Key behaviors
//! -------------
//! - [`BinnConfig::new`] takes the real-time horizon and fills the defaults:
//!   8 compartments (`keep_d = false`), linear policy, unmasked contact
//!   rate, standard architecture, 1000 collocation samples, policy offset 1.
//! - `with_*` setters return the updated config for chaining.
//! - [`BinnConfig::validate`] runs before any network is built.
//!
//! Conventions
//! -----------
//! - `contact_bounds`, `tracing_bounds`, `diagnosis_bounds` of `None` use the
//!   rate kind's defaults (`(0.2, 0.4)` / masked `(0.1, 0.5)`, `(0.1, 0.3)`,
//!   `(0.1, 0.3)`).
//! - `loss_weights` of `None` uses [`LossWeights::for_variant`].
use crate::{
    model::{
        compartments::{CompartmentVariant, FoldDiagnosed, KeepDiagnosed},
        errors::{BinnError, BinnResult},
        weights::LossWeights,
    },
    network::activations::Activation,
    policy::PolicyCurve,
    rates::{RateBounds, RateKind},
};

/// Hidden-layer widths and activation of every network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkArchitecture {
    pub surface_hidden: Vec<usize>,
    pub rate_hidden: Vec<usize>,
    pub activation: Activation,
}

impl NetworkArchitecture {
    /// Surface `[512, 256, 256]`, rates `[256]`, ReLU.
    pub fn standard() -> Self {
        NetworkArchitecture {
            surface_hidden: vec![512, 256, 256],
            rate_hidden: vec![256],
            activation: Activation::Relu,
        }
    }

    /// Standard surface with three hidden layers of 256 in each rate.
    pub fn deep() -> Self {
        NetworkArchitecture { rate_hidden: vec![256, 256, 256], ..NetworkArchitecture::standard() }
    }

    fn validate(&self) -> BinnResult<()> {
        for (name, widths) in [("surface", &self.surface_hidden), ("rate", &self.rate_hidden)] {
            if widths.iter().any(|&w| w == 0) {
                return Err(BinnError::Configuration {
                    reason: format!("{name} hidden widths must be positive, got {widths:?}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for NetworkArchitecture {
    fn default() -> Self {
        NetworkArchitecture::standard()
    }
}

/// Model construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnConfig {
    /// Real-time horizon; normalized time 1 corresponds to this many days.
    pub t_max_real: f64,
    /// Keep the explicit diagnosed compartment (9) or fold it (8).
    pub keep_d: bool,
    pub policy: PolicyCurve,
    /// Use the 4-input contact rate with the intervention level.
    pub masked_contact: bool,
    pub contact_bounds: Option<RateBounds>,
    pub tracing_bounds: Option<RateBounds>,
    pub diagnosis_bounds: Option<RateBounds>,
    pub tracing_array: Option<Vec<f64>>,
    pub architecture: NetworkArchitecture,
    pub loss_weights: Option<LossWeights>,
    /// Collocation samples drawn per physics evaluation.
    pub num_samples: usize,
    /// Added to real time before evaluating the policy curve.
    pub policy_time_offset: f64,
    /// Lower end of the normalized time domain; rows at this time get the
    /// initial-condition emphasis.
    pub t_min: f64,
    pub seed: u64,
}

impl BinnConfig {
    pub fn new(t_max_real: f64) -> Self {
        BinnConfig {
            t_max_real,
            keep_d: false,
            policy: PolicyCurve::Linear,
            masked_contact: false,
            contact_bounds: None,
            tracing_bounds: None,
            diagnosis_bounds: None,
            tracing_array: None,
            architecture: NetworkArchitecture::standard(),
            loss_weights: None,
            num_samples: 1000,
            policy_time_offset: 1.0,
            t_min: 0.0,
            seed: 0,
        }
    }

    pub fn with_keep_d(mut self, keep_d: bool) -> Self {
        self.keep_d = keep_d;
        self
    }

    /// Select the policy shape by identifier (`None` → linear).
    ///
    /// # Errors
    /// [`BinnError::UnknownPolicyShape`] for unrecognized identifiers.
    pub fn with_chi_type(mut self, chi_type: Option<&str>) -> BinnResult<Self> {
        self.policy = PolicyCurve::from_identifier(chi_type)?;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: PolicyCurve) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_masked_contact(mut self, masked: bool) -> Self {
        self.masked_contact = masked;
        self
    }

    /// Contact-rate bounds `(yita_lb, yita_ub)`.
    ///
    /// # Errors
    /// [`BinnError::Configuration`] for invalid bounds.
    pub fn with_contact_bounds(mut self, lower: f64, upper: f64) -> BinnResult<Self> {
        self.contact_bounds = Some(RateBounds::new(lower, upper)?);
        Ok(self)
    }

    pub fn with_tracing_bounds(mut self, lower: f64, upper: f64) -> BinnResult<Self> {
        self.tracing_bounds = Some(RateBounds::new(lower, upper)?);
        Ok(self)
    }

    pub fn with_diagnosis_bounds(mut self, lower: f64, upper: f64) -> BinnResult<Self> {
        self.diagnosis_bounds = Some(RateBounds::new(lower, upper)?);
        Ok(self)
    }

    pub fn with_tracing_array(mut self, tracing_array: Vec<f64>) -> Self {
        self.tracing_array = Some(tracing_array);
        self
    }

    pub fn with_architecture(mut self, architecture: NetworkArchitecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_loss_weights(mut self, weights: LossWeights) -> Self {
        self.loss_weights = Some(weights);
        self
    }

    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn with_policy_time_offset(mut self, offset: f64) -> Self {
        self.policy_time_offset = offset;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_compartments(&self) -> usize {
        if self.keep_d { KeepDiagnosed::N_COMPARTMENTS } else { FoldDiagnosed::N_COMPARTMENTS }
    }

    pub fn contact_kind(&self) -> RateKind {
        if self.masked_contact { RateKind::MaskedContact } else { RateKind::Contact }
    }

    pub fn contact_bounds(&self) -> RateBounds {
        self.contact_bounds.unwrap_or_else(|| self.contact_kind().default_bounds())
    }

    pub fn tracing_bounds(&self) -> RateBounds {
        self.tracing_bounds.unwrap_or_else(|| RateKind::Tracing.default_bounds())
    }

    pub fn diagnosis_bounds(&self) -> RateBounds {
        self.diagnosis_bounds.unwrap_or_else(|| RateKind::Diagnosis.default_bounds())
    }

    /// Loss weights for variant `V`, explicit or default.
    pub fn loss_weights_for<V: CompartmentVariant>(&self) -> LossWeights {
        self.loss_weights.clone().unwrap_or_else(LossWeights::for_variant::<V>)
    }

    /// # Errors
    /// [`BinnError::Configuration`] for a non-positive or non-finite horizon,
    /// zero collocation samples, a non-finite offset or time origin, zero
    /// hidden widths, or invalid loss weights.
    pub fn validate(&self) -> BinnResult<()> {
        if !self.t_max_real.is_finite() || self.t_max_real <= 0.0 {
            return Err(BinnError::Configuration {
                reason: format!("t_max_real must be finite and > 0, got {}", self.t_max_real),
            });
        }
        if self.num_samples == 0 {
            return Err(BinnError::Configuration {
                reason: "num_samples must be at least 1".to_string(),
            });
        }
        if !self.policy_time_offset.is_finite() || !self.t_min.is_finite() {
            return Err(BinnError::Configuration {
                reason: "policy_time_offset and t_min must be finite".to_string(),
            });
        }
        self.architecture.validate()?;
        if let Some(weights) = &self.loss_weights {
            weights.validate(self.n_compartments())?;
        }
        Ok(())
    }
}
