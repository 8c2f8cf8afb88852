//! Epidemiological constants supplied once at model construction.
//!
//! Purpose
//! -------
//! Hold the fixed rates of the compartment model and validate them before
//! any network is built. Parameters are read-only after construction.
//!
//! Key behaviors
//! -------------
//! - Deserializes from the JSON object used by the data generator, with
//!   keys `population, alpha, beta, gamma, mu, lamda, p_asymp, n_contacts,
//!   delta, eff_ub` and the optional `dynamic_tracing`, `tracing_array`.
//!   `lamda` (sic) is the recovery rate.
//! - A missing required key or a value outside its domain is a
//!   [`BinnError::Configuration`].
//!
//! Invariants & assumptions
//! ------------------------
//! - All values finite; `population > 0`; transition rates nonnegative;
//!   `p_asymp ∈ [0, 1]`; `eff_ub ∈ [0, 1]`.
//! - `beta` is kept for completeness; the models use the learned tracing
//!   rate times `chi(t)` in its place.
use serde::{Deserialize, Serialize};

use crate::model::errors::{BinnError, BinnResult};

/// Fixed epidemiological constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub population: f64,
    /// Rate at which tested/traced individuals return to susceptible.
    pub alpha: f64,
    /// Baseline tracing rate.
    pub beta: f64,
    /// Incubation rate (exposed → infectious).
    pub gamma: f64,
    /// Diagnosis rate of symptomatic individuals.
    pub mu: f64,
    /// Recovery rate.
    pub lamda: f64,
    /// Fraction of infections that are asymptomatic.
    pub p_asymp: f64,
    /// Average number of contacts traced per diagnosis.
    pub n_contacts: f64,
    /// Death rate.
    pub delta: f64,
    /// Upper bound of the policy curve.
    pub eff_ub: f64,
    /// Presence marks the tracing schedule as time-varying; the value itself
    /// is not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_tracing: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing_array: Option<Vec<f64>>,
}

impl ModelParameters {
    /// Parse and validate a JSON object.
    ///
    /// # Errors
    /// [`BinnError::Configuration`] for malformed JSON, missing keys or any
    /// value failing [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> BinnResult<Self> {
        let params: ModelParameters = serde_json::from_str(json)
            .map_err(|e| BinnError::Configuration { reason: e.to_string() })?;
        params.validate()?;
        Ok(params)
    }

    /// As [`from_json_str`](Self::from_json_str), from an already parsed value.
    pub fn from_json_value(value: serde_json::Value) -> BinnResult<Self> {
        let params: ModelParameters = serde_json::from_value(value)
            .map_err(|e| BinnError::Configuration { reason: e.to_string() })?;
        params.validate()?;
        Ok(params)
    }

    pub fn is_dynamic_tracing(&self) -> bool {
        self.dynamic_tracing.is_some()
    }

    /// Check every constant against its domain.
    pub fn validate(&self) -> BinnResult<()> {
        let named = [
            ("population", self.population),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("mu", self.mu),
            ("lamda", self.lamda),
            ("p_asymp", self.p_asymp),
            ("n_contacts", self.n_contacts),
            ("delta", self.delta),
            ("eff_ub", self.eff_ub),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(invalid(name, value, "must be finite"));
            }
            if value < 0.0 {
                return Err(invalid(name, value, "must be nonnegative"));
            }
        }
        if self.population <= 0.0 {
            return Err(invalid("population", self.population, "must be positive"));
        }
        if self.p_asymp > 1.0 {
            return Err(invalid("p_asymp", self.p_asymp, "must lie in [0, 1]"));
        }
        if self.eff_ub > 1.0 {
            return Err(invalid("eff_ub", self.eff_ub, "must lie in [0, 1]"));
        }
        if let Some(array) = &self.tracing_array {
            if let Some((i, v)) = array.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(BinnError::Configuration {
                    reason: format!("tracing_array[{i}] is non-finite: {v}"),
                });
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, value: f64, rule: &str) -> BinnError {
    BinnError::Configuration { reason: format!("parameter '{name}' {rule}, got {value}") }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SCENARIO_JSON: &str = r#"{
        "population": 1000000,
        "alpha": 0.1,
        "beta": 0.155,
        "gamma": 0.2,
        "mu": 0.1,
        "lamda": 0.2,
        "p_asymp": 0.6,
        "n_contacts": 3,
        "delta": 0.01,
        "eff_ub": 0.3
    }"#;

    pub(crate) fn scenario() -> ModelParameters {
        ModelParameters::from_json_str(SCENARIO_JSON).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The reference scenario parses, including integer-valued keys.
    //
    // Given
    // -----
    // The JSON object of the end-to-end scenario.
    //
    // Expect
    // ------
    // Fields match; optional keys absent; not dynamic.
    fn scenario_parses() {
        let p = scenario();
        assert_eq!(p.population, 1e6);
        assert_eq!(p.lamda, 0.2);
        assert_eq!(p.n_contacts, 3.0);
        assert!(!p.is_dynamic_tracing());
        assert!(p.tracing_array.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Missing keys and out-of-domain values are configuration errors.
    //
    // Given
    // -----
    // The scenario without `delta`, and with `p_asymp = 1.5`.
    //
    // Expect
    // ------
    // `Configuration` mentioning the offending key.
    fn missing_or_invalid_keys_fail() {
        // Arrange
        let mut value: serde_json::Value = serde_json::from_str(SCENARIO_JSON).unwrap();
        let mut missing = value.clone();
        missing.as_object_mut().unwrap().remove("delta");
        value["p_asymp"] = serde_json::json!(1.5);

        // Act
        let missing_err = ModelParameters::from_json_value(missing).unwrap_err();
        let range_err = ModelParameters::from_json_value(value).unwrap_err();

        // Assert
        match missing_err {
            BinnError::Configuration { reason } => assert!(reason.contains("delta"), "{reason}"),
            other => panic!("unexpected {other:?}"),
        }
        match range_err {
            BinnError::Configuration { reason } => assert!(reason.contains("p_asymp"), "{reason}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Optional tracing keys are carried through.
    //
    // Given
    // -----
    // The scenario plus `dynamic_tracing: 1` and a short `tracing_array`.
    //
    // Expect
    // ------
    // Dynamic flag set; array preserved.
    fn optional_tracing_keys() {
        let mut value: serde_json::Value = serde_json::from_str(SCENARIO_JSON).unwrap();
        value["dynamic_tracing"] = serde_json::json!(1);
        value["tracing_array"] = serde_json::json!([0.1, 0.2, 0.3]);

        let p = ModelParameters::from_json_value(value).unwrap();

        assert!(p.is_dynamic_tracing());
        assert_eq!(p.tracing_array.as_deref(), Some(&[0.1, 0.2, 0.3][..]));
    }
}
