//! epi_binn — biologically-informed neural networks for epidemic
//! compartment models.
//!
//! Purpose
//! -------
//! Fit a neural surrogate of compartment fractions (S, T, E, A, Y, D, Q, R,
//! F) to observed trajectories while forcing it to satisfy a compartment ODE
//! system whose contact, tracing and diagnosis rates are themselves learned
//! by small bounded networks. Serves as the crate root for Rust callers and,
//! behind the `python-bindings` feature, as the PyO3 bridge exposing a
//! `BINN` class to Python.
//!
//! Key behaviors
//! -------------
//! - [`network`]: dense MLPs with exact forward-mode input derivatives and
//!   flat parameter access.
//! - [`surface`], [`rates`], [`policy`]: the surface fitter, the bounded rate
//!   functions and the intervention policy curve.
//! - [`model`]: parameters, loss weights, the 9- and 8-compartment ODE
//!   tables, and the learned-surface and denoised model families behind the
//!   [`model::DifferentialModel`] trait.
//! - [`training`]: argmin L-BFGS over the flattened parameters with
//!   resampled collocation rounds.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; the PyO3 items here only
//!   convert inputs, call into the crate and map errors to `ValueError`.
//! - The structural variant is chosen once at model construction
//!   (`keep_d`), never per call.
//!
//! Downstream usage
//! ----------------
//! - Rust callers typically `use epi_binn::prelude::*`, build a model with
//!   [`model::build_model`] and train it with [`training::fit`].
//! - Python callers use `epi_binn.models.BINN`.
pub mod model;
pub mod network;
pub mod policy;
pub mod rates;
pub mod surface;
pub mod training;
#[cfg(feature = "python-bindings")]
pub mod utils;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use epi_binn::prelude::*;
//
// to import the main modelling and training surface in a single line.

pub mod prelude {
    pub use crate::model::{
        build_denoised_model, build_model, BinnConfig, BinnError, BinnResult, Compartment,
        CompartmentVariant, DifferentialModel, FoldDiagnosed, ForwardPass, KeepDiagnosed,
        LossBreakdown, LossWeights, ModelParameters, NetworkArchitecture, Observations,
        PhysicsResidual, PrecomputedDerivativeTable,
    };
    pub use crate::network::{Activation, Parameterized};
    pub use crate::policy::PolicyCurve;
    pub use crate::training::{
        fit, LineSearcher, Tolerances, TrainError, TrainOptions, TrainOutcome, TrainResult,
    };
}

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use rand::{rngs::StdRng, SeedableRng};

#[cfg(feature = "python-bindings")]
use crate::{
    model::{build_model, DifferentialModel, ModelParameters},
    training::{fit, TrainOutcome},
    utils::{build_binn_config, extract_observations, extract_times, extract_train_options},
};

#[cfg(feature = "python-bindings")]
#[pyclass(module = "epi_binn.models")]
pub struct BINN {
    inner: Box<dyn DifferentialModel>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl BINN {
    #[new]
    #[pyo3(
        signature = (
            params_json,
            t_max_real,
            keep_d = false,
            chi_type = None,
            masked_contact = false,
            yita_bounds = None,
            num_samples = None,
            seed = None,
            deep = false,
        ),
        text_signature = "(params_json, t_max_real, /, keep_d=False, chi_type=None, \
                          masked_contact=False, yita_bounds=None, num_samples=None, \
                          seed=None, deep=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params_json: &str, t_max_real: f64, keep_d: bool, chi_type: Option<&str>,
        masked_contact: bool, yita_bounds: Option<(f64, f64)>, num_samples: Option<usize>,
        seed: Option<u64>, deep: bool,
    ) -> PyResult<Self> {
        let params = ModelParameters::from_json_str(params_json)?;
        let config = build_binn_config(
            t_max_real,
            keep_d,
            chi_type,
            masked_contact,
            yita_bounds,
            num_samples,
            seed,
            deep,
        )?;
        let inner = build_model(params, &config)?;
        Ok(BINN { inner })
    }

    #[getter]
    pub fn variant(&self) -> &'static str {
        self.inner.variant_name()
    }

    #[getter]
    pub fn n_compartments(&self) -> usize {
        self.inner.n_compartments()
    }

    #[getter]
    pub fn num_parameters(&self) -> usize {
        self.inner.num_parameters()
    }

    /// Surrogate compartment fractions, one row per time.
    #[pyo3(text_signature = "(self, t, /)")]
    pub fn forward<'py>(
        &self, py: Python<'py>, t: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let time = extract_times(py, t)?;
        let pass = self.inner.forward(time.view())?;
        let (_, output) = pass.into_parts();
        Ok(output.into_pyarray(py))
    }

    /// Total loss against `observed` with a collocation batch drawn from `seed`.
    #[pyo3(signature = (t, observed, seed = None), text_signature = "(self, t, observed, /, seed=None)")]
    pub fn loss<'py>(
        &self, py: Python<'py>, t: &Bound<'py, PyAny>, observed: &Bound<'py, PyAny>,
        seed: Option<u64>,
    ) -> PyResult<f64> {
        let observations = extract_observations(py, t, observed)?;
        observations.ensure_compartments(self.inner.n_compartments())?;
        let pass = self.inner.forward(observations.time())?;
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or(0));
        Ok(self.inner.total_loss(&pass, observations.values(), &mut rng)?)
    }

    #[pyo3(
        signature = (
            t,
            observed,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            rounds = None,
            seed = None,
            verbose = None,
        ),
        text_signature = "(self, t, observed, /, tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher='MoreThuente', lbfgs_mem=None, rounds=1, seed=0, \
                          verbose=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, t: &Bound<'py, PyAny>, observed: &Bound<'py, PyAny>,
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, lbfgs_mem: Option<usize>, rounds: Option<usize>,
        seed: Option<u64>, verbose: Option<bool>,
    ) -> PyResult<TrainSummary> {
        let observations = extract_observations(py, t, observed)?;
        let options = extract_train_options(
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            rounds,
            seed,
            verbose,
        )?;
        let outcome = fit(self.inner.as_mut(), &observations, &options)?;
        Ok(TrainSummary { inner: outcome })
    }

    /// Flattened network parameters.
    pub fn parameters<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.parameters().into_pyarray(py)
    }
}

#[cfg(feature = "python-bindings")]
#[pyclass(module = "epi_binn.models")]
pub struct TrainSummary {
    inner: TrainOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl TrainSummary {
    #[getter]
    pub fn loss_history(&self) -> Vec<f64> {
        self.inner.loss_history()
    }

    #[getter]
    pub fn initial_losses(&self) -> Vec<f64> {
        self.inner.rounds.iter().map(|r| r.initial_loss).collect()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.total_iterations()
    }

    #[getter]
    pub fn statuses(&self) -> Vec<String> {
        self.inner.rounds.iter().map(|r| r.status.clone()).collect()
    }

    #[getter]
    pub fn converged(&self) -> Vec<bool> {
        self.inner.rounds.iter().map(|r| r.converged).collect()
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _epi_binn<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(py, "models")?;
    models_mod.add_class::<BINN>()?;
    models_mod.add_class::<TrainSummary>()?;
    m.add_submodule(&models_mod)?;

    // Register the submodule in sys.modules so dot-notation imports work.
    py.import("sys")?.getattr("modules")?.set_item("epi_binn.models", models_mod)?;
    Ok(())
}
