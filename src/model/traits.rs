//! The interface shared by every BINN variant.
//!
//! Purpose
//! -------
//! Let the training loop and the bindings work with any structural variant
//! (9 or 8 compartments) and any surface source (learned surface or fixed
//! denoised table) through one object-safe trait, selected once at
//! construction.
//!
//! Key behaviors
//! -------------
//! - [`DifferentialModel::forward`] returns a [`ForwardPass`] that carries
//!   its own time batch; the loss methods take it as an argument, so the
//!   model holds no per-call state and `&self` evaluation is safe to share
//!   across threads.
//! - [`DifferentialModel::total_loss`] draws a fresh collocation batch from
//!   the caller's RNG on every call. [`DifferentialModel::loss_breakdown`]
//!   takes the collocation batch explicitly, for reproducible evaluation.
//!
//! Downstream usage
//! ----------------
//! - `training::fit` freezes one collocation batch per round and minimizes
//!   `loss_breakdown(..).total` over [`Parameterized::parameters`].
use std::fmt;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::RngCore;

use crate::{
    model::{
        data::ForwardPass, errors::BinnResult, loss::LossBreakdown, physics::PhysicsResidual,
    },
    network::parameters::Parameterized,
};

/// A biologically-informed model of compartment dynamics.
pub trait DifferentialModel: Parameterized + fmt::Debug + Send + Sync {
    /// Structural variant label.
    fn variant_name(&self) -> &'static str;

    fn n_compartments(&self) -> usize;

    /// Surrogate compartment fractions at each time.
    fn forward(&self, time: ArrayView1<f64>) -> BinnResult<ForwardPass>;

    /// Generalized least-squares data loss of `pass` against `observed`.
    fn data_loss(&self, pass: &ForwardPass, observed: ArrayView2<f64>) -> BinnResult<f64>;

    /// ODE residual and monotonicity penalties at the collocation `time`.
    fn physics_residual(&self, time: ArrayView1<f64>) -> BinnResult<PhysicsResidual>;

    /// Draw a collocation batch in the model's time domain.
    fn sample_collocation(&self, rng: &mut dyn RngCore) -> Array1<f64>;

    /// All loss terms with physics evaluated at `collocation`.
    fn loss_breakdown(
        &self, pass: &ForwardPass, observed: ArrayView2<f64>, collocation: ArrayView1<f64>,
    ) -> BinnResult<LossBreakdown>;

    /// Total loss with a freshly sampled collocation batch.
    fn total_loss(
        &self, pass: &ForwardPass, observed: ArrayView2<f64>, rng: &mut dyn RngCore,
    ) -> BinnResult<f64> {
        let collocation = self.sample_collocation(rng);
        Ok(self.loss_breakdown(pass, observed, collocation.view())?.total)
    }

    fn box_clone(&self) -> Box<dyn DifferentialModel>;
}

impl Clone for Box<dyn DifferentialModel> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
