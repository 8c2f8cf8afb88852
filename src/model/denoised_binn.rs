//! BINN over a fixed denoised trajectory: trains only the rates.
//!
//! Purpose
//! -------
//! Reuse the physics residual with the surface replaced by lookups into a
//! [`PrecomputedDerivativeTable`]. Only the three rate networks are
//! trainable; the table is a constant.
//!
//! Key behaviors
//! -------------
//! - Times are real days. `forward` and `physics_residual` round each time
//!   to the nearest day and look up row `day − 1`; days outside the table
//!   are [`BinnError::TimeOutOfRange`].
//! - The table's derivatives are per day and used directly as the ODE
//!   left-hand side. The policy curve is evaluated at
//!   `policy_time_offset + day`.
//! - Collocation days are uniform integers in `[1, min(⌊t_max_real⌋, days)]`.
//! - `loss_breakdown` is `pde_weight · physics`; there is no data term
//!   because the surface is fixed.
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
        table::PrecomputedDerivativeTable,
        traits::DifferentialModel,
        weights::LossWeights,
    },
    network::{mlp::MlpBuilder, parameters::Parameterized, NetworkResult},
    policy::PolicyCurve,
};

/// Rate-only BINN for structural variant `V`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoisedBinn<V: CompartmentVariant> {
    table: PrecomputedDerivativeTable,
    rates: RateNetworks,
    policy: PolicyCurve,
    params: ModelParameters,
    weights: LossWeights,
    max_day: usize,
    num_samples: usize,
    policy_time_offset: f64,
    _variant: PhantomData<V>,
}

impl<V: CompartmentVariant> DenoisedBinn<V> {
    /// Build fresh rate networks from `config` around `table`.
    pub fn from_config(
        params: ModelParameters, config: &BinnConfig, table: PrecomputedDerivativeTable,
    ) -> BinnResult<Self> {
        config.validate()?;
        let mut builder = MlpBuilder::seeded(config.seed);
        let arch = &config.architecture;
        let rates = RateNetworks::build(
            &mut builder,
            config.contact_kind(),
            &arch.rate_hidden,
            arch.activation,
            [config.contact_bounds(), config.tracing_bounds(), config.diagnosis_bounds()],
        )?;
        DenoisedBinn::from_parts(table, rates, params, config)
    }

    /// # Errors
    /// - [`BinnError::ShapeMismatch`] when the table width is not
    ///   `V::N_COMPARTMENTS`.
    /// - [`BinnError::Configuration`] when `t_max_real < 1` leaves no day to
    ///   sample.
    pub fn from_parts(
        table: PrecomputedDerivativeTable, rates: RateNetworks, params: ModelParameters,
        config: &BinnConfig,
    ) -> BinnResult<Self> {
        config.validate()?;
        params.validate()?;
        if table.n_compartments() != V::N_COMPARTMENTS {
            return Err(BinnError::ShapeMismatch {
                context: "derivative table columns",
                expected: V::N_COMPARTMENTS,
                found: table.n_compartments(),
            });
        }
        let horizon = config.t_max_real.floor() as usize;
        let max_day = horizon.min(table.days());
        if max_day == 0 {
            return Err(BinnError::Configuration {
                reason: format!("t_max_real {} leaves no day to sample", config.t_max_real),
            });
        }
        let weights = config.loss_weights_for::<V>();
        weights.validate(V::N_COMPARTMENTS)?;
        debug!(
            variant = V::NAME,
            days = table.days(),
            max_day,
            parameters = rates.num_parameters(),
            "constructed denoised model"
        );
        Ok(DenoisedBinn {
            table,
            rates,
            policy: config.policy,
            params,
            weights,
            max_day,
            num_samples: config.num_samples,
            policy_time_offset: config.policy_time_offset,
            _variant: PhantomData,
        })
    }

    pub fn table(&self) -> &PrecomputedDerivativeTable {
        &self.table
    }

    pub fn rates(&self) -> &RateNetworks {
        &self.rates
    }

    pub fn max_day(&self) -> usize {
        self.max_day
    }
}

impl<V: CompartmentVariant> Parameterized for DenoisedBinn<V> {
    fn num_parameters(&self) -> usize {
        self.rates.num_parameters()
    }

    fn parameters(&self) -> Array1<f64> {
        self.rates.parameters()
    }

    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()> {
        self.rates.set_parameters(theta)
    }
}

impl<V: CompartmentVariant> DifferentialModel for DenoisedBinn<V> {
    fn variant_name(&self) -> &'static str {
        V::NAME
    }

    fn n_compartments(&self) -> usize {
        V::N_COMPARTMENTS
    }

    fn forward(&self, time: ArrayView1<f64>) -> BinnResult<ForwardPass> {
        let (values, _) = self.table.lookup(time)?;
        ForwardPass::new(time.to_owned(), values)
    }

    fn data_loss(&self, pass: &ForwardPass, observed: ArrayView2<f64>) -> BinnResult<f64> {
        gls_loss(pass, observed, &self.weights, 1.0)
    }

    fn physics_residual(&self, time: ArrayView1<f64>) -> BinnResult<PhysicsResidual> {
        let (u, du) = self.table.lookup(time)?;
        let days = time.mapv(f64::round);
        let real = days.mapv(|d| self.policy_time_offset + d);
        let chi = self.policy.evaluate(real.view(), self.params.eff_ub)?;
        evaluate_physics::<V>(u.view(), du.view(), chi.view(), &self.rates, &self.params, &self.weights)
    }

    fn sample_collocation(&self, rng: &mut dyn RngCore) -> Array1<f64> {
        let max_day = self.max_day;
        Array1::from_shape_simple_fn(self.num_samples, || rng.random_range(1..=max_day) as f64)
    }

    /// `pass` and `observed` are not used: the surface is fixed.
    fn loss_breakdown(
        &self, _pass: &ForwardPass, _observed: ArrayView2<f64>, collocation: ArrayView1<f64>,
    ) -> BinnResult<LossBreakdown> {
        let physics = self.physics_residual(collocation)?;
        let total = ensure_finite("total loss", self.weights.pde_weight * physics.total())?;
        debug!(
            variant = V::NAME,
            physics = physics.residual,
            penalties = physics.penalties.total(),
            total,
            "denoised loss evaluated"
        );
        Ok(LossBreakdown { data: 0.0, physics: Some(physics), total })
    }

    fn box_clone(&self) -> Box<dyn DifferentialModel> {
        Box::new(self.clone())
    }
}
