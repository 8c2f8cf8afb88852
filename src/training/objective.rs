//! The objective minimized by the training loop.
//!
//! Purpose
//! -------
//! Express "total BINN loss as a function of the flattened network
//! parameters" in a form the argmin adapter can drive.
//!
//! Key behaviors
//! -------------
//! - [`Objective`] is the generic interface: `value(θ, data)`, a one-shot
//!   `check`, and an optional analytic `grad`. The default `grad` returns
//!   [`TrainError::GradientNotImplemented`], which makes the adapter fall
//!   back to finite differences.
//! - [`ModelObjective`] implements it for any boxed [`DifferentialModel`]. It
//!   owns a scratch copy of the model; each evaluation writes `θ` into the
//!   scratch copy, runs `forward` on the observation times and returns
//!   `loss_breakdown(..).total` against the frozen collocation batch.
//! - [`TrainingBatch`] is the data payload: observations plus one frozen
//!   collocation batch, so every evaluation of a round sees the same loss
//!   surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - The scratch model is only touched through `RefCell::borrow_mut` inside
//!   a single evaluation; evaluations never nest.
//! - The caller's model is never mutated here; `fit` writes the best
//!   parameters back after the round.
use std::cell::RefCell;

use ndarray::Array1;

use crate::{
    model::{data::Observations, traits::DifferentialModel},
    training::{
        errors::{TrainError, TrainResult},
        types::{Cost, Grad, Theta},
        validation::validate_theta,
    },
};

/// A scalar objective over a flat parameter vector.
pub trait Objective {
    type Data: 'static;

    /// Loss at `theta`.
    fn value(&self, theta: &Theta, data: &Self::Data) -> TrainResult<Cost>;

    /// Reject unusable `theta`/`data` pairs. Called once before a round.
    fn check(&self, theta: &Theta, data: &Self::Data) -> TrainResult<()>;

    /// Analytic gradient of [`Objective::value`], if available.
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> TrainResult<Grad> {
        Err(TrainError::GradientNotImplemented)
    }
}

/// Observations and the collocation batch frozen for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingBatch {
    observations: Observations,
    collocation: Array1<f64>,
}

impl TrainingBatch {
    pub fn new(observations: Observations, collocation: Array1<f64>) -> Self {
        TrainingBatch { observations, collocation }
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn collocation(&self) -> &Array1<f64> {
        &self.collocation
    }
}

/// Total loss of a [`DifferentialModel`] as a function of its parameters.
#[derive(Debug)]
pub struct ModelObjective {
    scratch: RefCell<Box<dyn DifferentialModel>>,
}

impl ModelObjective {
    pub fn new(model: Box<dyn DifferentialModel>) -> Self {
        ModelObjective { scratch: RefCell::new(model) }
    }

    pub fn num_parameters(&self) -> usize {
        self.scratch.borrow().num_parameters()
    }
}

impl Objective for ModelObjective {
    type Data = TrainingBatch;

    fn value(&self, theta: &Theta, data: &TrainingBatch) -> TrainResult<Cost> {
        let mut model = self.scratch.borrow_mut();
        model.set_parameters(theta.view())?;
        let observations = data.observations();
        let pass = model.forward(observations.time())?;
        let breakdown =
            model.loss_breakdown(&pass, observations.values(), data.collocation().view())?;
        Ok(breakdown.total)
    }

    fn check(&self, theta: &Theta, data: &TrainingBatch) -> TrainResult<()> {
        let model = self.scratch.borrow();
        validate_theta(theta, model.num_parameters())?;
        data.observations().ensure_compartments(model.n_compartments())?;
        if data.collocation().is_empty() {
            return Err(TrainError::EmptyCollocation);
        }
        Ok(())
    }
}
