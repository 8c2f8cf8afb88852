//! BINN with a learned surface: joint data fit and physics residual.
//!
//! Purpose
//! -------
//! Compose the surface fitter, the three rate networks and the policy curve
//! into the model trained end to end on observed trajectories. Time is
//! normalized: `t ∈ [0, 1]` spans `t_max_real` days.
//!
//! Key behaviors
//! -------------
//! - `forward` evaluates the softmax surface.
//! - `physics_residual` recomputes `u(t)` and the exact `du/dt` at the
//!   collocation times, converts to `du/dt_real = du/dt / t_max_real`, and
//!   evaluates the policy curve at `policy_time_offset + t · t_max_real`.
//! - `loss_breakdown` returns `surface_weight · data + pde_weight · physics`;
//!   with `pde_weight == 0` the physics term is skipped and the total is
//!   exactly `surface_weight · data`.
//! - Collocation times are `U[0, 1)`, `num_samples` per draw.
//!
//! Invariants & assumptions
//! ------------------------
//! - The surface has `V::N_COMPARTMENTS` outputs; checked in `from_parts`.
//! - Parameter layout: surface, contact, tracing, diagnosis.
use std::marker::PhantomData;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::{
    model::{
        compartments::CompartmentVariant,
        config::BinnConfig,
        data::ForwardPass,
        errors::{BinnError, BinnResult},
        guards::ensure_finite,
        loss::{gls_loss, LossBreakdown},
        parameters::ModelParameters,
        physics::{evaluate_physics, PhysicsResidual, RateNetworks},
        traits::DifferentialModel,
        weights::LossWeights,
    },
    network::{
        mlp::MlpBuilder,
        parameters::{concatenate_parameters, distribute_parameters, Parameterized},
        NetworkResult,
    },
    policy::PolicyCurve,
    surface::SurfaceFitter,
};

/// Learned-surface BINN for structural variant `V`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceBinn<V: CompartmentVariant> {
    surface: SurfaceFitter,
    rates: RateNetworks,
    policy: PolicyCurve,
    params: ModelParameters,
    weights: LossWeights,
    t_max_real: f64,
    t_min: f64,
    num_samples: usize,
    policy_time_offset: f64,
    tracing_array: Option<Vec<f64>>,
    _variant: PhantomData<V>,
}

impl<V: CompartmentVariant> SurfaceBinn<V> {
    /// Build freshly initialized networks from `config` (seeded by
    /// `config.seed`).
    ///
    /// # Errors
    /// Any configuration or parameter validation error.
    pub fn from_config(params: ModelParameters, config: &BinnConfig) -> BinnResult<Self> {
        config.validate()?;
        let mut builder = MlpBuilder::seeded(config.seed);
        let arch = &config.architecture;
        let surface = SurfaceFitter::build(
            &mut builder,
            V::N_COMPARTMENTS,
            &arch.surface_hidden,
            arch.activation,
        )?;
        let rates = RateNetworks::build(
            &mut builder,
            config.contact_kind(),
            &arch.rate_hidden,
            arch.activation,
            [config.contact_bounds(), config.tracing_bounds(), config.diagnosis_bounds()],
        )?;
        SurfaceBinn::from_parts(surface, rates, params, config)
    }

    /// Assemble from existing networks.
    ///
    /// # Errors
    /// [`BinnError::ShapeMismatch`] when the surface width is not
    /// `V::N_COMPARTMENTS`, plus configuration validation errors.
    pub fn from_parts(
        surface: SurfaceFitter, rates: RateNetworks, params: ModelParameters, config: &BinnConfig,
    ) -> BinnResult<Self> {
        config.validate()?;
        params.validate()?;
        if surface.n_compartments() != V::N_COMPARTMENTS {
            return Err(BinnError::ShapeMismatch {
                context: "surface outputs",
                expected: V::N_COMPARTMENTS,
                found: surface.n_compartments(),
            });
        }
        let weights = config.loss_weights_for::<V>();
        weights.validate(V::N_COMPARTMENTS)?;
        let tracing_array = config.tracing_array.clone().or_else(|| params.tracing_array.clone());
        debug!(
            variant = V::NAME,
            parameters = surface.num_parameters() + rates.num_parameters(),
            policy = config.policy.identifier(),
            "constructed surface model"
        );
        Ok(SurfaceBinn {
            surface,
            rates,
            policy: config.policy,
            params,
            weights,
            t_max_real: config.t_max_real,
            t_min: config.t_min,
            num_samples: config.num_samples,
            policy_time_offset: config.policy_time_offset,
            tracing_array,
            _variant: PhantomData,
        })
    }

    pub fn surface(&self) -> &SurfaceFitter {
        &self.surface
    }

    pub fn rates(&self) -> &RateNetworks {
        &self.rates
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    pub fn weights(&self) -> &LossWeights {
        &self.weights
    }

    pub fn tracing_array(&self) -> Option<&[f64]> {
        self.tracing_array.as_deref()
    }

    /// Policy values at normalized times.
    pub fn policy_values(&self, time: ArrayView1<f64>) -> BinnResult<Array1<f64>> {
        let real = time.mapv(|t| self.policy_time_offset + t * self.t_max_real);
        Ok(self.policy.evaluate(real.view(), self.params.eff_ub)?)
    }
}

impl<V: CompartmentVariant> Parameterized for SurfaceBinn<V> {
    fn num_parameters(&self) -> usize {
        self.surface.num_parameters() + self.rates.num_parameters()
    }

    fn parameters(&self) -> Array1<f64> {
        concatenate_parameters(&[&self.surface, &self.rates])
    }

    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()> {
        distribute_parameters(theta, &mut [&mut self.surface, &mut self.rates])
    }
}

impl<V: CompartmentVariant> DifferentialModel for SurfaceBinn<V> {
    fn variant_name(&self) -> &'static str {
        V::NAME
    }

    fn n_compartments(&self) -> usize {
        V::N_COMPARTMENTS
    }

    fn forward(&self, time: ArrayView1<f64>) -> BinnResult<ForwardPass> {
        let output = self.surface.evaluate(time)?;
        ForwardPass::new(time.to_owned(), output)
    }

    fn data_loss(&self, pass: &ForwardPass, observed: ArrayView2<f64>) -> BinnResult<f64> {
        gls_loss(pass, observed, &self.weights, self.t_min)
    }

    fn physics_residual(&self, time: ArrayView1<f64>) -> BinnResult<PhysicsResidual> {
        let (u, du) = self.surface.evaluate_with_time_derivative(time)?;
        let lhs = du / self.t_max_real;
        let chi = self.policy_values(time)?;
        evaluate_physics::<V>(u.view(), lhs.view(), chi.view(), &self.rates, &self.params, &self.weights)
    }

    fn sample_collocation(&self, rng: &mut dyn RngCore) -> Array1<f64> {
        Array1::from_shape_simple_fn(self.num_samples, || rng.random::<f64>())
    }

    fn loss_breakdown(
        &self, pass: &ForwardPass, observed: ArrayView2<f64>, collocation: ArrayView1<f64>,
    ) -> BinnResult<LossBreakdown> {
        let data = self.data_loss(pass, observed)?;
        let mut total = self.weights.surface_weight * data;
        let physics = if self.weights.pde_weight > 0.0 {
            let physics = self.physics_residual(collocation)?;
            total += self.weights.pde_weight * physics.total();
            Some(physics)
        } else {
            None
        };
        let total = ensure_finite("total loss", total)?;
        debug!(
            variant = V::NAME,
            data,
            physics = physics.as_ref().map(|p| p.residual),
            penalties = physics.as_ref().map(|p| p.penalties.total()),
            total,
            "loss evaluated"
        );
        Ok(LossBreakdown { data, physics, total })
    }

    fn box_clone(&self) -> Box<dyn DifferentialModel> {
        Box::new(self.clone())
    }
}
