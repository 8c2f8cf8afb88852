//! Integration tests for the BINN pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: parameters from JSON, model construction
//!   for both structural variants, loss evaluation, and multi-round L-BFGS
//!   training on a fixed synthetic dataset.
//! - Exercise the rate-only model over a denoised derivative table.
//!
//! Coverage
//! --------
//! - `model::build_model` / `model::build_denoised_model` with `keep_d`
//!   selecting 9 or 8 compartments.
//! - `training::fit` with small networks and few iterations.
//! - Error surfaces: missing parameter keys, unknown policy shapes,
//!   observation width mismatches, out-of-range denoised days.
//!
//! Exclusions
//! ----------
//! - Per-component numerics (activations, tangents, policy shapes, rate
//!   bounds, ODE tables) are covered by unit tests.
//! - Python bindings.
use epi_binn::{
    model::{
        build_denoised_model, build_model, BinnConfig, BinnError, DifferentialModel,
        FoldDiagnosed, KeepDiagnosed, LossWeights, ModelParameters, NetworkArchitecture, Observations,
        PrecomputedDerivativeTable,
    },
    network::Activation,
    training::{fit, LineSearcher, Tolerances, TrainError, TrainOptions},
};
use ndarray::{Array1, Array2};

const SCENARIO_JSON: &str = r#"{
    "population": 1e6,
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

fn scenario() -> ModelParameters {
    ModelParameters::from_json_str(SCENARIO_JSON).unwrap()
}

fn small_architecture() -> NetworkArchitecture {
    NetworkArchitecture { surface_hidden: vec![8], rate_hidden: vec![4], activation: Activation::Tanh }
}

fn small_config(keep_d: bool) -> BinnConfig {
    let weights = if keep_d {
        LossWeights::for_variant::<KeepDiagnosed>()
    } else {
        LossWeights::for_variant::<FoldDiagnosed>()
    };
    BinnConfig::new(180.0)
        .with_keep_d(keep_d)
        .with_architecture(small_architecture())
        .with_loss_weights(weights.with_pde_weight(1.0))
        .with_num_samples(16)
        .with_seed(21)
}

/// Initial condition of the scenario: S ≈ 0.99, every other compartment small.
fn initial_condition(n: usize) -> Array1<f64> {
    let small = 0.01 / (n as f64 - 1.0);
    let mut ic = Array1::from_elem(n, small);
    ic[0] = 0.99;
    ic
}

/// A flat synthetic trajectory sitting at the initial condition.
fn flat_dataset(n: usize, rows: usize) -> Observations {
    let ic = initial_condition(n);
    let t = Array1::linspace(0.0, 1.0, rows);
    let values = Array2::from_shape_fn((rows, n), |(_, c)| ic[c]);
    Observations::new(t, values).unwrap()
}

fn distance_at_origin(model: &dyn DifferentialModel, ic: &Array1<f64>) -> f64 {
    let pass = model.forward(Array1::<f64>::zeros(1).view()).unwrap();
    let row = pass.output().row(0).to_owned();
    (&row - ic).mapv(|d| d * d).sum().sqrt()
}

fn training_options(rounds: usize, max_iter: usize) -> TrainOptions {
    let tols = Tolerances::new(None, None, Some(max_iter)).unwrap();
    TrainOptions::new(tols, LineSearcher::MoreThuente, None, rounds, 4, false).unwrap()
}

#[test]
// Purpose
// -------
// A short training run moves `forward(0)` toward the initial condition and
// lowers the loss on a fixed evaluation batch.
//
// Given
// -----
// The reference scenario, t_max_real = 180, a 9-compartment model with small
// networks, 12 observations of a flat trajectory at the initial condition,
// 3 rounds of 15 L-BFGS iterations.
//
// Expect
// ------
// - every round ends no worse than it started,
// - total loss on one frozen batch is lower after training,
// - `forward(0)` is closer to the initial condition, finite and on the simplex.
fn end_to_end_scenario_training() {
    // Arrange
    let mut model = build_model(scenario(), &small_config(true)).unwrap();
    assert_eq!(model.n_compartments(), 9);
    let data = flat_dataset(9, 12);
    let ic = initial_condition(9);
    let eval_batch = Array1::linspace(0.05, 0.95, 16);
    let loss_on = |m: &dyn DifferentialModel| {
        let pass = m.forward(data.time()).unwrap();
        m.loss_breakdown(&pass, data.values(), eval_batch.view()).unwrap().total
    };
    let loss_before = loss_on(model.as_ref());
    let distance_before = distance_at_origin(model.as_ref(), &ic);

    // Act
    let outcome = fit(model.as_mut(), &data, &training_options(3, 15)).unwrap();

    // Assert
    assert_eq!(outcome.rounds.len(), 3);
    for round in &outcome.rounds {
        assert!(round.final_loss <= round.initial_loss);
    }
    let loss_after = loss_on(model.as_ref());
    assert!(loss_after < loss_before, "loss {loss_before} -> {loss_after}");

    let distance_after = distance_at_origin(model.as_ref(), &ic);
    assert!(distance_after < distance_before, "distance {distance_before} -> {distance_after}");
    let u0 = model.forward(Array1::<f64>::zeros(1).view()).unwrap();
    assert!(u0.output().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    assert!((u0.output().sum() - 1.0).abs() < 1e-12);
}

#[test]
// Purpose
// -------
// `keep_d` selects the structural variant once; both variants evaluate the
// same scenario and reject observations of the other width.
//
// Given
// -----
// The scenario built with `keep_d = true` and `keep_d = false`.
//
// Expect
// ------
// 9 and 8 compartments with finite losses; a 9-column dataset fed to the
// 8-compartment model fails with a shape mismatch.
fn variants_share_one_interface() {
    // Arrange
    let keep = build_model(scenario(), &small_config(true)).unwrap();
    let fold = build_model(scenario(), &small_config(false)).unwrap();
    let nine = flat_dataset(9, 6);
    let eight = flat_dataset(8, 6);
    let collocation = Array1::linspace(0.1, 0.9, 8);

    // Act
    let keep_pass = keep.forward(nine.time()).unwrap();
    let fold_pass = fold.forward(eight.time()).unwrap();
    let keep_loss = keep.loss_breakdown(&keep_pass, nine.values(), collocation.view()).unwrap();
    let fold_loss = fold.loss_breakdown(&fold_pass, eight.values(), collocation.view()).unwrap();
    let mismatch = fit(fold.clone().as_mut(), &nine, &training_options(1, 1));

    // Assert
    assert_eq!(keep.n_compartments(), 9);
    assert_eq!(fold.n_compartments(), 8);
    assert_ne!(keep.variant_name(), fold.variant_name());
    assert!(keep_loss.total.is_finite() && fold_loss.total.is_finite());
    assert_eq!(keep_loss.physics.unwrap().compartments.len(), 9);
    assert_eq!(fold_loss.physics.unwrap().compartments.len(), 8);
    assert!(matches!(
        mismatch,
        Err(TrainError::Model(BinnError::ShapeMismatch { expected: 8, found: 9, .. }))
    ));
}

#[test]
// Purpose
// -------
// The rate-only model trains over a denoised table and bounds-checks days.
//
// Given
// -----
// A 40-day, 9-compartment table with a gentle trend, t_max_real = 30, one
// round of 5 iterations.
//
// Expect
// ------
// - `forward(day)` returns the table row `day - 1`,
// - the round ends no worse than it started,
// - days 0 and 41 are `TimeOutOfRange`.
fn denoised_model_pipeline() {
    // Arrange
    let days = 40;
    let values = Array2::from_shape_fn((days, 9), |(d, c)| {
        let s = 0.99 - 0.002 * d as f64;
        if c == 0 { s } else { (1.0 - s) / 8.0 }
    });
    let derivatives = Array2::from_shape_fn((days, 9), |(_, c)| if c == 0 { -0.002 } else { 0.00025 });
    let table = PrecomputedDerivativeTable::new(values.clone(), derivatives).unwrap();
    let config = BinnConfig::new(30.0)
        .with_keep_d(true)
        .with_architecture(small_architecture())
        .with_num_samples(20);
    let mut model = build_denoised_model(scenario(), &config, table).unwrap();
    let t = Array1::from_iter((1..=10).map(f64::from));
    let observed = values.slice(ndarray::s![0..10, ..]).to_owned();
    let data = Observations::new(t.clone(), observed).unwrap();

    // Act
    let pass = model.forward(t.view()).unwrap();
    let outcome = fit(model.as_mut(), &data, &training_options(1, 5)).unwrap();
    let low = model.forward(Array1::from(vec![0.0]).view());
    let high = model.forward(Array1::from(vec![41.0]).view());

    // Assert
    assert_eq!(pass.output().row(2), values.row(2));
    assert!(outcome.rounds[0].final_loss <= outcome.rounds[0].initial_loss);
    assert!(matches!(low, Err(BinnError::TimeOutOfRange { .. })));
    assert!(matches!(high, Err(BinnError::TimeOutOfRange { .. })));
}

#[test]
// Purpose
// -------
// Construction-time errors are reported before any evaluation.
//
// Given
// -----
// JSON without `lamda`, an unknown policy shape, and an invalid line search.
//
// Expect
// ------
// `Configuration`, `UnknownPolicyShape` and `InvalidLineSearch`.
fn construction_errors_surface_early() {
    // Arrange
    let missing = SCENARIO_JSON.replace("\"lamda\": 0.2,", "");

    // Act
    let params = ModelParameters::from_json_str(&missing);
    let shape = BinnConfig::new(180.0).with_chi_type(Some("exponential"));
    let searcher = "newton".parse::<LineSearcher>();

    // Assert
    assert!(matches!(params, Err(BinnError::Configuration { .. })));
    assert!(matches!(shape, Err(BinnError::UnknownPolicyShape { ref name }) if name == "exponential"));
    assert!(matches!(searcher, Err(TrainError::InvalidLineSearch { .. })));
}
