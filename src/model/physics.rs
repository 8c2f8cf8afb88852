//! Physics residual: ODE mismatch plus monotonicity penalties.
//!
//! Purpose
//! -------
//! Given a state batch, its time derivative (the ODE left-hand side) and the
//! policy values at the same times, evaluate the learned rates, build every
//! right-hand side from the variant's table and reduce the squared
//! mismatches into the physics loss.
//!
//! Key behaviors
//! -------------
//! - [`RateNetworks::evaluate`] runs the three rates on the batch once and
//!   returns the rate field together with the exact partials
//!   `∂yita/∂A, ∂yita/∂Y, ∂tau/∂A, ∂tau/∂Y`.
//! - [`evaluate_physics`] sums `residual_weights[c] · (lhs_c − rhs_c)²` over
//!   the residual-checked compartments, scales by `pde_loss_weight` and
//!   averages over the batch. Unchecked compartments (`R`, `F`) are still
//!   evaluated and reported in [`PhysicsResidual::compartments`].
//! - Monotonicity: `∂(yita·(A+Y))/∂A = yita + (A+Y)·∂yita/∂A` (same for `Y`)
//!   and `∂tau/∂A`, `∂tau/∂Y` should be nonnegative. Each is penalized by
//!   `weight · mean(min(d, 0)²)`, so a nonnegative derivative costs exactly 0.
//!
//! Invariants & assumptions
//! ------------------------
//! - `state`, `lhs` share shape `(rows, V::N_COMPARTMENTS)`; `chi` has `rows`.
//! - All returned scalars are finite; otherwise `NumericalInstability`.
use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::debug;

use crate::{
    model::{
        compartments::{Compartment, CompartmentVariant, OdeState, OdeTerms, RateField},
        errors::{BinnError, BinnResult},
        guards::{ensure_finite, ensure_len},
        parameters::ModelParameters,
        weights::LossWeights,
    },
    network::{
        activations::Activation,
        mlp::NetworkBuilder,
        parameters::{concatenate_parameters, distribute_parameters, Parameterized},
        NetworkResult,
    },
    rates::{RateBounds, RateFunction, RateKind, RateSensitivity},
};

/// The three learned rates of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct RateNetworks {
    contact: RateFunction,
    tracing: RateFunction,
    diagnosis: RateFunction,
}

/// Rate field on a batch plus the partials used by the penalties.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEvaluation {
    pub field: RateField,
    pub contact_da: Array1<f64>,
    pub contact_dy: Array1<f64>,
    pub diagnosis_da: Array1<f64>,
    pub diagnosis_dy: Array1<f64>,
}

impl RateNetworks {
    /// # Errors
    /// [`BinnError::Configuration`] when a rate of the wrong kind is passed
    /// in a slot.
    pub fn new(
        contact: RateFunction, tracing: RateFunction, diagnosis: RateFunction,
    ) -> BinnResult<Self> {
        let slots = [
            ("contact", &contact, matches!(contact.kind(), RateKind::Contact | RateKind::MaskedContact)),
            ("tracing", &tracing, tracing.kind() == RateKind::Tracing),
            ("diagnosis", &diagnosis, diagnosis.kind() == RateKind::Diagnosis),
        ];
        for (slot, rate, ok) in slots {
            if !ok {
                return Err(BinnError::Configuration {
                    reason: format!("{slot} slot holds a {} rate", rate.kind()),
                });
            }
        }
        Ok(RateNetworks { contact, tracing, diagnosis })
    }

    /// Build all three rates with the same hidden widths and activation.
    pub fn build<B: NetworkBuilder>(
        builder: &mut B, contact_kind: RateKind, hidden: &[usize], activation: Activation,
        bounds: [RateBounds; 3],
    ) -> BinnResult<Self> {
        let [contact_bounds, tracing_bounds, diagnosis_bounds] = bounds;
        let contact = RateFunction::build(contact_kind, builder, hidden, activation, contact_bounds)?;
        let tracing =
            RateFunction::build(RateKind::Tracing, builder, hidden, activation, tracing_bounds)?;
        let diagnosis =
            RateFunction::build(RateKind::Diagnosis, builder, hidden, activation, diagnosis_bounds)?;
        RateNetworks::new(contact, tracing, diagnosis)
    }

    pub fn contact(&self) -> &RateFunction {
        &self.contact
    }

    pub fn tracing(&self) -> &RateFunction {
        &self.tracing
    }

    pub fn diagnosis(&self) -> &RateFunction {
        &self.diagnosis
    }

    /// Evaluate rates and partials on `state` with policy values `chi`.
    ///
    /// `beta = chi · tracing`.
    pub fn evaluate(&self, state: &OdeState, chi: ArrayView1<f64>) -> BinnResult<RateEvaluation> {
        ensure_len("policy values", state.len(), chi.len())?;
        let (s, a, y) = (state.s.view(), state.a.view(), state.y.view());

        let contact_kind = self.contact.kind();
        let contact_inputs = contact_kind.gather(s, a, y, chi)?;
        let contact = self
            .contact
            .evaluate_with_sensitivities(contact_inputs.view(), contact_kind.infectious_columns())?;

        let tracing_inputs = RateKind::Tracing.gather(s, a, y, chi)?;
        let tracing = self.tracing.evaluate(tracing_inputs.view())?;

        let diagnosis_inputs = RateKind::Diagnosis.gather(s, a, y, chi)?;
        let diagnosis = self.diagnosis.evaluate_with_sensitivities(
            diagnosis_inputs.view(),
            RateKind::Diagnosis.infectious_columns(),
        )?;

        let (yita, contact_da, contact_dy) = split_pair(contact)?;
        let (tau, diagnosis_da, diagnosis_dy) = split_pair(diagnosis)?;
        let beta = &chi * &tracing;

        Ok(RateEvaluation {
            field: RateField { yita, beta, tau },
            contact_da,
            contact_dy,
            diagnosis_da,
            diagnosis_dy,
        })
    }
}

fn split_pair(sens: RateSensitivity) -> BinnResult<(Array1<f64>, Array1<f64>, Array1<f64>)> {
    let found = sens.partials.len();
    let [da, dy]: [Array1<f64>; 2] = sens.partials.try_into().map_err(|_| {
        BinnError::ShapeMismatch { context: "rate sensitivities", expected: 2, found }
    })?;
    Ok((sens.value, da, dy))
}

impl Parameterized for RateNetworks {
    fn num_parameters(&self) -> usize {
        self.contact.num_parameters() + self.tracing.num_parameters() + self.diagnosis.num_parameters()
    }

    fn parameters(&self) -> Array1<f64> {
        concatenate_parameters(&[&self.contact, &self.tracing, &self.diagnosis])
    }

    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()> {
        distribute_parameters(theta, &mut [&mut self.contact, &mut self.tracing, &mut self.diagnosis])
    }
}

/// Monotonicity penalties, already multiplied by their weights.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonotonicityPenalties {
    /// Penalty on `∂(yita·(A+Y))/∂A < 0`.
    pub contact_asymptomatic: f64,
    /// Penalty on `∂(yita·(A+Y))/∂Y < 0`.
    pub contact_symptomatic: f64,
    /// Penalty on `∂tau/∂A < 0`.
    pub diagnosis_asymptomatic: f64,
    /// Penalty on `∂tau/∂Y < 0`.
    pub diagnosis_symptomatic: f64,
}

impl MonotonicityPenalties {
    pub fn total(&self) -> f64 {
        self.contact_asymptomatic
            + self.contact_symptomatic
            + self.diagnosis_asymptomatic
            + self.diagnosis_symptomatic
    }
}

/// Mean squared ODE mismatch of one compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentResidual {
    pub compartment: Compartment,
    pub mean_squared: f64,
    pub residual_checked: bool,
}

/// Result of one physics evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsResidual {
    /// `mean(pde_loss_weight · Σ_checked w_c · r_c²)`.
    pub residual: f64,
    pub penalties: MonotonicityPenalties,
    /// Every compartment in table order, checked or not.
    pub compartments: Vec<CompartmentResidual>,
}

impl PhysicsResidual {
    /// Residual plus all penalties.
    pub fn total(&self) -> f64 {
        self.residual + self.penalties.total()
    }
}

/// `weight · mean(min(d, 0)²)`.
pub fn monotonicity_penalty(derivative: ArrayView1<f64>, weight: f64) -> f64 {
    if derivative.is_empty() {
        return 0.0;
    }
    let violation = derivative.mapv(|d| if d < 0.0 { d * d } else { 0.0 });
    weight * violation.mean().unwrap_or(0.0)
}

/// Physics residual of variant `V` on one batch.
///
/// # Errors
/// - [`BinnError::ShapeMismatch`] when `state`, `lhs`, `chi` disagree.
/// - [`BinnError::NumericalInstability`] for non-finite rates or terms.
pub fn evaluate_physics<V: CompartmentVariant>(
    state: ArrayView2<f64>, lhs: ArrayView2<f64>, chi: ArrayView1<f64>, rates: &RateNetworks,
    params: &ModelParameters, weights: &LossWeights,
) -> BinnResult<PhysicsResidual> {
    ensure_len("physics left-hand side rows", state.nrows(), lhs.nrows())?;
    ensure_len("physics left-hand side columns", V::N_COMPARTMENTS, lhs.ncols())?;
    ensure_len("residual weights", V::N_COMPARTMENTS, weights.residual_weights.len())?;
    let columns = OdeState::from_batch::<V>(state)?;
    let rated = rates.evaluate(&columns, chi)?;
    let terms = OdeTerms::new(&columns, &rated.field, params);

    let mut pde = Array1::<f64>::zeros(columns.len());
    let mut compartments = Vec::with_capacity(V::N_COMPARTMENTS);
    for ((entry, observed), &w) in
        V::table().iter().zip(lhs.columns()).zip(weights.residual_weights.iter())
    {
        let rhs = (entry.rhs)(&terms);
        let squared = (&observed - &rhs).mapv(|r| r * r);
        if entry.residual_checked {
            pde.scaled_add(w, &squared);
        }
        compartments.push(CompartmentResidual {
            compartment: entry.compartment,
            mean_squared: squared.mean().unwrap_or(0.0),
            residual_checked: entry.residual_checked,
        });
    }
    pde *= weights.pde_loss_weight;
    let residual = ensure_finite("physics residual", pde.mean().unwrap_or(0.0))?;

    let infectious = &columns.a + &columns.y;
    let contact_a = &rated.contact_da * &infectious + &rated.field.yita;
    let contact_y = &rated.contact_dy * &infectious + &rated.field.yita;
    let cw = weights.contact_monotonicity_weight;
    let dw = weights.diagnosis_monotonicity_weight;
    let penalties = MonotonicityPenalties {
        contact_asymptomatic: ensure_finite(
            "contact monotonicity (A)",
            monotonicity_penalty(contact_a.view(), cw),
        )?,
        contact_symptomatic: ensure_finite(
            "contact monotonicity (Y)",
            monotonicity_penalty(contact_y.view(), cw),
        )?,
        diagnosis_asymptomatic: ensure_finite(
            "diagnosis monotonicity (A)",
            monotonicity_penalty(rated.diagnosis_da.view(), dw),
        )?,
        diagnosis_symptomatic: ensure_finite(
            "diagnosis monotonicity (Y)",
            monotonicity_penalty(rated.diagnosis_dy.view(), dw),
        )?,
    };

    debug!(
        variant = V::NAME,
        samples = columns.len(),
        residual,
        penalties = penalties.total(),
        "physics residual evaluated"
    );
    Ok(PhysicsResidual { residual, penalties, compartments })
}
