//! Learned, bounded rate functions of the compartment state.
//!
//! Purpose
//! -------
//! Wrap a sigmoid-output [`Mlp`] as one of the model's state-dependent
//! rates and affinely rescale its `(0, 1)` output into configured bounds.
//!
//! Key behaviors
//! -------------
//! - [`RateKind`] fixes which state slice a rate consumes:
//!   - `Contact`: `[S, A, Y]`
//!   - `MaskedContact`: `[S, A, Y, chi]` (intervention level as 4th input)
//!   - `Tracing`: `[S + A + Y, chi]`
//!   - `Diagnosis`: `[A, Y]`
//! - [`RateFunction::evaluate_with_sensitivities`] returns the rescaled rate
//!   and its exact partial derivatives with respect to the `A` and `Y`
//!   columns of its input, as needed by the monotonicity penalties.
//! - Every evaluation checks the input width before the network runs and
//!   checks the output for NaN/±inf after it.
//!
//! Invariants & assumptions
//! ------------------------
//! - The wrapped network has exactly `kind.input_size()` inputs, one output
//!   and a [`OutputActivation::Sigmoid`] output, so the rescaled rate lies in
//!   `[lower, upper]`.
use std::fmt;

use ndarray::{stack, Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::warn;

use crate::{
    network::{
        activations::{Activation, OutputActivation},
        mlp::{Mlp, NetworkBuilder},
        parameters::Parameterized,
        NetworkResult,
    },
    rates::{
        bounds::RateBounds,
        errors::{RateError, RateResult},
    },
};

/// Which learned rate a [`RateFunction`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKind {
    Contact,
    MaskedContact,
    Tracing,
    Diagnosis,
}

impl RateKind {
    pub fn input_size(self) -> usize {
        match self {
            RateKind::Contact => 3,
            RateKind::MaskedContact => 4,
            RateKind::Tracing | RateKind::Diagnosis => 2,
        }
    }

    /// Bounds used when the configuration does not override them.
    pub fn default_bounds(self) -> RateBounds {
        match self {
            RateKind::Contact => RateBounds::new_unchecked(0.2, 0.4),
            RateKind::MaskedContact => RateBounds::new_unchecked(0.1, 0.5),
            RateKind::Tracing | RateKind::Diagnosis => RateBounds::new_unchecked(0.1, 0.3),
        }
    }

    /// Input columns holding `A` and `Y`, in that order.
    ///
    /// Empty for [`RateKind::Tracing`], whose inputs aggregate the state.
    pub fn infectious_columns(self) -> &'static [usize] {
        match self {
            RateKind::Contact | RateKind::MaskedContact => &[1, 2],
            RateKind::Diagnosis => &[0, 1],
            RateKind::Tracing => &[],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RateKind::Contact => "contact",
            RateKind::MaskedContact => "masked contact",
            RateKind::Tracing => "tracing",
            RateKind::Diagnosis => "diagnosis",
        }
    }

    /// Label used when reporting a numerical problem with this rate.
    pub fn term(self) -> &'static str {
        match self {
            RateKind::Contact => "contact rate",
            RateKind::MaskedContact => "masked contact rate",
            RateKind::Tracing => "tracing rate",
            RateKind::Diagnosis => "diagnosis rate",
        }
    }

    /// Assemble this rate's input batch from state columns and the policy value.
    ///
    /// # Errors
    /// [`RateError::RaggedInputs`] when the columns differ in length.
    pub fn gather(
        self, s: ArrayView1<f64>, a: ArrayView1<f64>, y: ArrayView1<f64>, chi: ArrayView1<f64>,
    ) -> RateResult<Array2<f64>> {
        let n = s.len();
        if a.len() != n || y.len() != n || chi.len() != n {
            return Err(RateError::RaggedInputs { kind: self });
        }
        let out = match self {
            RateKind::Contact => stack(Axis(1), &[s.view(), a.view(), y.view()]),
            RateKind::MaskedContact => stack(Axis(1), &[s.view(), a.view(), y.view(), chi.view()]),
            RateKind::Tracing => {
                let total = &s + &a + &y;
                stack(Axis(1), &[total.view(), chi.view()])
            }
            RateKind::Diagnosis => stack(Axis(1), &[a.view(), y.view()]),
        };
        out.map_err(|_| RateError::RaggedInputs { kind: self })
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rescaled rate values with exact partials for selected input columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSensitivity {
    pub value: Array1<f64>,
    /// `partials[k] = ∂value/∂input[:, columns[k]]`, already rescaled.
    pub partials: Vec<Array1<f64>>,
}

/// A bounded learned rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateFunction {
    kind: RateKind,
    net: Mlp,
    bounds: RateBounds,
}

impl RateFunction {
    /// Wrap an existing network.
    ///
    /// # Errors
    /// - [`RateError::InputWidthMismatch`] if the network input size differs
    ///   from `kind.input_size()`.
    /// - [`RateError::OutputWidth`] unless the network has one output.
    /// - [`RateError::UnboundedOutput`] unless the output is sigmoid.
    pub fn new(kind: RateKind, net: Mlp, bounds: RateBounds) -> RateResult<Self> {
        if net.input_size() != kind.input_size() {
            return Err(RateError::InputWidthMismatch {
                kind,
                expected: kind.input_size(),
                found: net.input_size(),
            });
        }
        if net.output_size() != 1 {
            return Err(RateError::OutputWidth { kind, found: net.output_size() });
        }
        if net.output_activation() != OutputActivation::Sigmoid {
            return Err(RateError::UnboundedOutput { kind });
        }
        Ok(RateFunction { kind, net, bounds })
    }

    /// Build a freshly initialized rate network with the given hidden widths.
    pub fn build<B: NetworkBuilder>(
        kind: RateKind, builder: &mut B, hidden: &[usize], activation: Activation,
        bounds: RateBounds,
    ) -> RateResult<Self> {
        let mut widths = hidden.to_vec();
        widths.push(1);
        let net = builder.build(kind.input_size(), &widths, activation, OutputActivation::Sigmoid)?;
        RateFunction::new(kind, net, bounds)
    }

    pub fn kind(&self) -> RateKind {
        self.kind
    }

    pub fn bounds(&self) -> RateBounds {
        self.bounds
    }

    pub fn network(&self) -> &Mlp {
        &self.net
    }

    /// Rescaled rate for each input row.
    ///
    /// # Errors
    /// [`RateError::InputWidthMismatch`], [`RateError::NonFiniteRate`], or a
    /// wrapped network validation error.
    pub fn evaluate(&self, inputs: ArrayView2<f64>) -> RateResult<Array1<f64>> {
        self.check_width(inputs)?;
        let raw = self.net.forward(inputs)?;
        let value = raw.column(0).mapv(|r| self.bounds.rescale(r));
        self.check_finite(value.view())?;
        Ok(value)
    }

    /// Rescaled rate plus exact partials with respect to `columns`.
    pub fn evaluate_with_sensitivities(
        &self, inputs: ArrayView2<f64>, columns: &[usize],
    ) -> RateResult<RateSensitivity> {
        self.check_width(inputs)?;
        let pass = self.net.forward_with_tangents(inputs, columns)?;
        let value = pass.output.column(0).mapv(|r| self.bounds.rescale(r));
        self.check_finite(value.view())?;
        let span = self.bounds.span();
        let partials = pass.tangents.iter().map(|t| t.column(0).mapv(|d| span * d)).collect();
        Ok(RateSensitivity { value, partials })
    }

    fn check_width(&self, inputs: ArrayView2<f64>) -> RateResult<()> {
        if inputs.ncols() != self.kind.input_size() {
            return Err(RateError::InputWidthMismatch {
                kind: self.kind,
                expected: self.kind.input_size(),
                found: inputs.ncols(),
            });
        }
        Ok(())
    }

    fn check_finite(&self, value: ArrayView1<f64>) -> RateResult<()> {
        if let Some((index, &v)) = value.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            warn!(rate = self.kind.name(), index, value = v, "non-finite rate output");
            return Err(RateError::NonFiniteRate { kind: self.kind, index, value: v });
        }
        Ok(())
    }
}

impl Parameterized for RateFunction {
    fn num_parameters(&self) -> usize {
        self.net.num_parameters()
    }

    fn parameters(&self) -> Array1<f64> {
        self.net.parameters()
    }

    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()> {
        self.net.set_parameters(theta)
    }
}
