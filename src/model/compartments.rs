//! Compartment ODE right-hand sides for the two structural variants.
//!
//! Purpose
//! -------
//! Express each compartment's ODE right-hand side as a pure function of
//! (state, learned rates, parameters), and collect them into one table per
//! structural variant. Residual code iterates the table instead of
//! branching on compartment position or on whether `D` is tracked.
//!
//! Key behaviors
//! -------------
//! - [`OdeTerms`] precomputes the shared intermediates once per batch:
//!   `new_diagnoses = mu·Y + tau·Q`, the infection flux `yita·S·(A+Y)` and
//!   the tracing pressure `beta·new_diagnoses·n_contacts`.
//! - [`KeepDiagnosed`] (9 compartments, `S T E A Y D Q R F`) and
//!   [`FoldDiagnosed`] (8 compartments, `S T E A Y Q R F`) share the `S, T,
//!   E, A, Y` entries; they differ only in the `D, Q, R, F` entries.
//! - `R` and `F` are accumulations: their entries are computed but flagged
//!   `residual_checked = false`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Table order is the column order of every state batch for that variant.
//! - [`OdeState::from_batch`] fills `d` with zeros for the folded variant,
//!   so the shared entries never observe a missing column.
//!
//! Downstream usage
//! ----------------
//! - `model::physics` evaluates the table against the surrogate derivative.
//! - Tests compare the shared entries across both tables directly.
use std::fmt;

use ndarray::{Array1, Array2, ArrayView2};

use crate::model::{
    errors::{BinnError, BinnResult},
    parameters::ModelParameters,
};

/// Epidemiological compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compartment {
    Susceptible,
    Tested,
    Exposed,
    Asymptomatic,
    Symptomatic,
    Diagnosed,
    Quarantined,
    Recovered,
    Fatal,
}

impl Compartment {
    pub fn symbol(self) -> &'static str {
        match self {
            Compartment::Susceptible => "S",
            Compartment::Tested => "T",
            Compartment::Exposed => "E",
            Compartment::Asymptomatic => "A",
            Compartment::Symptomatic => "Y",
            Compartment::Diagnosed => "D",
            Compartment::Quarantined => "Q",
            Compartment::Recovered => "R",
            Compartment::Fatal => "F",
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// State columns of a batch, one array per compartment.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeState {
    pub s: Array1<f64>,
    pub t: Array1<f64>,
    pub e: Array1<f64>,
    pub a: Array1<f64>,
    pub y: Array1<f64>,
    pub d: Array1<f64>,
    pub q: Array1<f64>,
    pub r: Array1<f64>,
    pub f: Array1<f64>,
}

impl OdeState {
    /// All-zero state of `rows` samples.
    pub fn zeros(rows: usize) -> Self {
        let z = || Array1::zeros(rows);
        OdeState { s: z(), t: z(), e: z(), a: z(), y: z(), d: z(), q: z(), r: z(), f: z() }
    }

    /// Split a `(rows, V::N_COMPARTMENTS)` batch into columns using the
    /// variant's table order.
    ///
    /// # Errors
    /// [`BinnError::ShapeMismatch`] when the column count is wrong.
    pub fn from_batch<V: CompartmentVariant>(batch: ArrayView2<f64>) -> BinnResult<Self> {
        if batch.ncols() != V::N_COMPARTMENTS {
            return Err(BinnError::ShapeMismatch {
                context: "compartment batch",
                expected: V::N_COMPARTMENTS,
                found: batch.ncols(),
            });
        }
        let mut state = OdeState::zeros(batch.nrows());
        for (entry, column) in V::table().iter().zip(batch.columns()) {
            *state.column_mut(entry.compartment) = column.to_owned();
        }
        Ok(state)
    }

    pub fn column(&self, c: Compartment) -> &Array1<f64> {
        match c {
            Compartment::Susceptible => &self.s,
            Compartment::Tested => &self.t,
            Compartment::Exposed => &self.e,
            Compartment::Asymptomatic => &self.a,
            Compartment::Symptomatic => &self.y,
            Compartment::Diagnosed => &self.d,
            Compartment::Quarantined => &self.q,
            Compartment::Recovered => &self.r,
            Compartment::Fatal => &self.f,
        }
    }

    fn column_mut(&mut self, c: Compartment) -> &mut Array1<f64> {
        match c {
            Compartment::Susceptible => &mut self.s,
            Compartment::Tested => &mut self.t,
            Compartment::Exposed => &mut self.e,
            Compartment::Asymptomatic => &mut self.a,
            Compartment::Symptomatic => &mut self.y,
            Compartment::Diagnosed => &mut self.d,
            Compartment::Quarantined => &mut self.q,
            Compartment::Recovered => &mut self.r,
            Compartment::Fatal => &mut self.f,
        }
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }
}

/// Learned rates evaluated on a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RateField {
    /// Contact rate.
    pub yita: Array1<f64>,
    /// Effective tracing rate: `chi(t)` times the learned tracing output.
    pub beta: Array1<f64>,
    /// Quarantine diagnosis rate.
    pub tau: Array1<f64>,
}

/// Shared intermediates of the right-hand sides for one batch.
#[derive(Debug, Clone)]
pub struct OdeTerms<'a> {
    pub state: &'a OdeState,
    pub rates: &'a RateField,
    pub params: &'a ModelParameters,
    /// `mu·Y + tau·Q`.
    pub new_diagnoses: Array1<f64>,
    /// `yita·S·(A+Y)`.
    pub infection: Array1<f64>,
    /// `beta·new_diagnoses·n_contacts`.
    pub tracing_pressure: Array1<f64>,
}

impl<'a> OdeTerms<'a> {
    pub fn new(state: &'a OdeState, rates: &'a RateField, params: &'a ModelParameters) -> Self {
        let new_diagnoses = &state.y * params.mu + &(&rates.tau * &state.q);
        let infection = &rates.yita * &state.s * &(&state.a + &state.y);
        let tracing_pressure = &rates.beta * &new_diagnoses * params.n_contacts;
        OdeTerms { state, rates, params, new_diagnoses, infection, tracing_pressure }
    }
}

/// Right-hand side of one compartment.
pub type RhsFn = fn(&OdeTerms<'_>) -> Array1<f64>;

/// One row of a variant's ODE table.
#[derive(Debug, Clone, Copy)]
pub struct RhsEntry {
    pub compartment: Compartment,
    pub rhs: RhsFn,
    /// Whether this compartment contributes to the physics residual.
    pub residual_checked: bool,
}

const fn entry(compartment: Compartment, rhs: RhsFn, residual_checked: bool) -> RhsEntry {
    RhsEntry { compartment, rhs, residual_checked }
}

// ---- Shared entries ----

fn susceptible(x: &OdeTerms<'_>) -> Array1<f64> {
    &x.state.t * x.params.alpha - &x.infection - &(&x.tracing_pressure * &x.state.s)
}

fn tested(x: &OdeTerms<'_>) -> Array1<f64> {
    &x.tracing_pressure * &x.state.s - &(&x.state.t * x.params.alpha)
}

fn exposed(x: &OdeTerms<'_>) -> Array1<f64> {
    &x.infection - &(&x.state.e * x.params.gamma)
}

fn asymptomatic(x: &OdeTerms<'_>) -> Array1<f64> {
    let p = x.params;
    &x.state.e * (p.p_asymp * p.gamma)
        - &(&x.state.a * p.lamda)
        - &(&x.tracing_pressure * &x.state.a)
}

fn symptomatic(x: &OdeTerms<'_>) -> Array1<f64> {
    let p = x.params;
    &x.state.e * ((1.0 - p.p_asymp) * p.gamma)
        - &(&x.state.y * (p.mu + p.lamda + p.delta))
        - &(&x.tracing_pressure * &x.state.y)
}

// ---- Entries with an explicit diagnosed compartment ----

fn diagnosed(x: &OdeTerms<'_>) -> Array1<f64> {
    let p = x.params;
    &x.new_diagnoses - &(&x.state.d * (p.lamda + p.delta))
}

fn quarantined(x: &OdeTerms<'_>) -> Array1<f64> {
    let p = x.params;
    let outflow = (&x.rates.tau + (p.lamda + p.delta)) * &x.state.q;
    &x.tracing_pressure * &(&x.state.a + &x.state.y) - &outflow
}

fn recovered(x: &OdeTerms<'_>) -> Array1<f64> {
    let s = x.state;
    (&s.a + &s.y + &s.d + &s.q) * x.params.lamda
}

fn fatal(x: &OdeTerms<'_>) -> Array1<f64> {
    let s = x.state;
    (&s.y + &s.d + &s.q) * x.params.delta
}

// ---- Entries with diagnoses folded into quarantine ----

fn quarantined_folded(x: &OdeTerms<'_>) -> Array1<f64> {
    let p = x.params;
    &x.tracing_pressure * &(&x.state.a + &x.state.y) + &(&x.state.q * (p.mu - p.delta))
}

fn recovered_folded(x: &OdeTerms<'_>) -> Array1<f64> {
    let s = x.state;
    (&s.a + &s.y + &s.q) * x.params.lamda
}

fn fatal_folded(x: &OdeTerms<'_>) -> Array1<f64> {
    let s = x.state;
    (&s.y + &s.q) * x.params.delta
}

/// `S T E A Y D Q R F`.
pub static KEEP_DIAGNOSED_TABLE: [RhsEntry; 9] = [
    entry(Compartment::Susceptible, susceptible, true),
    entry(Compartment::Tested, tested, true),
    entry(Compartment::Exposed, exposed, true),
    entry(Compartment::Asymptomatic, asymptomatic, true),
    entry(Compartment::Symptomatic, symptomatic, true),
    entry(Compartment::Diagnosed, diagnosed, true),
    entry(Compartment::Quarantined, quarantined, true),
    entry(Compartment::Recovered, recovered, false),
    entry(Compartment::Fatal, fatal, false),
];

/// `S T E A Y Q R F`.
pub static FOLD_DIAGNOSED_TABLE: [RhsEntry; 8] = [
    entry(Compartment::Susceptible, susceptible, true),
    entry(Compartment::Tested, tested, true),
    entry(Compartment::Exposed, exposed, true),
    entry(Compartment::Asymptomatic, asymptomatic, true),
    entry(Compartment::Symptomatic, symptomatic, true),
    entry(Compartment::Quarantined, quarantined_folded, true),
    entry(Compartment::Recovered, recovered_folded, false),
    entry(Compartment::Fatal, fatal_folded, false),
];

/// A structural variant of the compartment model.
pub trait CompartmentVariant:
    fmt::Debug + Clone + Copy + Default + PartialEq + Send + Sync + 'static
{
    const N_COMPARTMENTS: usize;
    const NAME: &'static str;

    fn table() -> &'static [RhsEntry];

    /// Per-compartment magnitude weights for the data loss.
    fn default_compartment_weights() -> Array1<f64>;

    fn index_of(c: Compartment) -> Option<usize> {
        Self::table().iter().position(|e| e.compartment == c)
    }

    /// Evaluate every right-hand side into a `(rows, N_COMPARTMENTS)` block.
    fn rhs(terms: &OdeTerms<'_>) -> Array2<f64> {
        let mut out = Array2::zeros((terms.state.len(), Self::N_COMPARTMENTS));
        for (entry, mut column) in Self::table().iter().zip(out.columns_mut()) {
            column.assign(&(entry.rhs)(terms));
        }
        out
    }
}

/// Nine compartments with an explicit diagnosed compartment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeepDiagnosed;

/// Eight compartments; diagnoses feed quarantine directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldDiagnosed;

impl CompartmentVariant for KeepDiagnosed {
    const N_COMPARTMENTS: usize = 9;
    const NAME: &'static str = "keep-diagnosed";

    fn table() -> &'static [RhsEntry] {
        &KEEP_DIAGNOSED_TABLE
    }

    fn default_compartment_weights() -> Array1<f64> {
        Array1::from(vec![1.0, 1000.0, 1.0, 1000.0, 1000.0, 1.0, 1000.0, 1.0, 1000.0])
    }
}

impl CompartmentVariant for FoldDiagnosed {
    const N_COMPARTMENTS: usize = 8;
    const NAME: &'static str = "fold-diagnosed";

    fn table() -> &'static [RhsEntry] {
        &FOLD_DIAGNOSED_TABLE
    }

    fn default_compartment_weights() -> Array1<f64> {
        Array1::from(vec![1.0, 1.0, 1.0, 1.0, 1.0, 1000.0, 1.0, 1000.0])
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the ODE tables.
    //!
    //! Covered:
    //! - the two variants agree on the shared compartments,
    //! - closed form of individual entries,
    //! - the 9-compartment right-hand sides conserve total mass,
    //! - residual flags and column layout.
    use super::*;
    use crate::model::parameters::tests::scenario;
    use ndarray::array;

    fn sample_state() -> OdeState {
        OdeState {
            s: array![0.95, 0.7],
            t: array![0.01, 0.05],
            e: array![0.01, 0.04],
            a: array![0.006, 0.03],
            y: array![0.004, 0.02],
            d: array![0.002, 0.01],
            q: array![0.003, 0.05],
            r: array![0.01, 0.08],
            f: array![0.005, 0.02],
        }
    }

    fn sample_rates() -> RateField {
        RateField { yita: array![0.3, 0.25], beta: array![0.05, 0.1], tau: array![0.2, 0.15] }
    }

    #[test]
    // Purpose
    // -------
    // The folded variant is a consistent reduction of the full variant.
    //
    // Given
    // -----
    // One state with `D = 0` and identical rates, evaluated through both
    // tables.
    //
    // Expect
    // ------
    // S, T, E, A, Y right-hand sides are identical.
    fn variants_agree_on_shared_compartments() {
        // Arrange
        let params = scenario();
        let mut state = sample_state();
        state.d.fill(0.0);
        let rates = sample_rates();
        let terms = OdeTerms::new(&state, &rates, &params);

        // Act
        let full = KeepDiagnosed::rhs(&terms);
        let folded = FoldDiagnosed::rhs(&terms);

        // Assert
        for c in [
            Compartment::Susceptible,
            Compartment::Tested,
            Compartment::Exposed,
            Compartment::Asymptomatic,
            Compartment::Symptomatic,
        ] {
            let i = KeepDiagnosed::index_of(c).unwrap();
            let j = FoldDiagnosed::index_of(c).unwrap();
            assert_eq!(full.column(i), folded.column(j), "{c}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Spot-check closed forms of individual entries.
    //
    // Given
    // -----
    // The sample state, rates and scenario parameters.
    //
    // Expect
    // ------
    // dS/dt, dD/dt and the folded dQ/dt match hand-written expressions.
    fn entries_match_closed_form() {
        // Arrange
        let p = scenario();
        let x = sample_state();
        let r = sample_rates();
        let terms = OdeTerms::new(&x, &r, &p);

        // Act
        let full = KeepDiagnosed::rhs(&terms);
        let folded = FoldDiagnosed::rhs(&terms);

        // Assert
        for i in 0..2 {
            let nd = p.mu * x.y[i] + r.tau[i] * x.q[i];
            let pressure = r.beta[i] * nd * p.n_contacts;
            let ds = -r.yita[i] * x.s[i] * (x.a[i] + x.y[i]) - pressure * x.s[i] + p.alpha * x.t[i];
            let dd = nd - p.lamda * x.d[i] - p.delta * x.d[i];
            let dq = pressure * (x.a[i] + x.y[i]) + p.mu * x.q[i] - p.delta * x.q[i];
            assert!((full[[i, 0]] - ds).abs() < 1e-15);
            assert!((full[[i, 5]] - dd).abs() < 1e-15);
            assert!((folded[[i, 5]] - dq).abs() < 1e-15);
        }
    }

    #[test]
    // Purpose
    // -------
    // With D tracked, every outflow is some other compartment's inflow.
    //
    // Given
    // -----
    // The sample state and rates.
    //
    // Expect
    // ------
    // Each row of the 9-compartment right-hand side sums to ~0.
    fn keep_diagnosed_conserves_mass() {
        let p = scenario();
        let x = sample_state();
        let r = sample_rates();
        let terms = OdeTerms::new(&x, &r, &p);

        let full = KeepDiagnosed::rhs(&terms);

        for row in full.rows() {
            assert!(row.sum().abs() < 1e-14, "row sum {}", row.sum());
        }
    }

    #[test]
    // Purpose
    // -------
    // Residual flags and column layout per variant.
    //
    // Given
    // -----
    // Both tables; a 9-column batch read as the folded variant.
    //
    // Expect
    // ------
    // 7 of 9 and 6 of 8 checked (R, F excluded); the folded layout puts Q in
    // column 5; the wrong width is a `ShapeMismatch`.
    fn residual_flags_and_layout() {
        let checked = |t: &[RhsEntry]| t.iter().filter(|e| e.residual_checked).count();
        assert_eq!(checked(KeepDiagnosed::table()), 7);
        assert_eq!(checked(FoldDiagnosed::table()), 6);
        for t in [KeepDiagnosed::table(), FoldDiagnosed::table()] {
            assert!(t
                .iter()
                .filter(|e| !e.residual_checked)
                .all(|e| matches!(e.compartment, Compartment::Recovered | Compartment::Fatal)));
        }
        assert_eq!(FoldDiagnosed::index_of(Compartment::Quarantined), Some(5));
        assert_eq!(FoldDiagnosed::index_of(Compartment::Diagnosed), None);

        let batch = Array2::<f64>::zeros((3, 9));
        assert!(matches!(
            OdeState::from_batch::<FoldDiagnosed>(batch.view()),
            Err(BinnError::ShapeMismatch { expected: 8, found: 9, .. })
        ));
        let folded = Array2::from_shape_fn((2, 8), |(i, j)| (i * 8 + j) as f64);
        let state = OdeState::from_batch::<FoldDiagnosed>(folded.view()).unwrap();
        assert_eq!(state.q, array![5.0, 13.0]);
        assert_eq!(state.d, array![0.0, 0.0]);
    }
}
