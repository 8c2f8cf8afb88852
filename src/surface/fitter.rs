//! Surface fitter: time → compartment fractions on the probability simplex.
//!
//! Purpose
//! -------
//! Provide the surrogate `u(t)` replacing an integrated ODE solution. Each
//! time maps to a vector over compartments that is nonnegative and sums to 1.
//!
//! Key behaviors
//! -------------
//! - [`SurfaceFitter::evaluate`] validates the time batch (non-empty,
//!   finite), reshapes it to a `(rows, 1)` column and runs the softmax
//!   network.
//! - [`SurfaceFitter::evaluate_with_time_derivative`] returns `u(t)` and the
//!   exact `du/dt` from the same forward pass, for the ODE left-hand side.
//!
//! Invariants & assumptions
//! ------------------------
//! - The wrapped network has 1 input, at least 2 outputs and a softmax
//!   output; checked at construction.
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{
    network::{
        activations::{Activation, OutputActivation},
        mlp::{Mlp, NetworkBuilder, TangentOutput},
        parameters::Parameterized,
        NetworkResult,
    },
    surface::errors::{SurfaceError, SurfaceResult},
};

/// Softmax network over a scalar time input.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFitter {
    net: Mlp,
}

impl SurfaceFitter {
    /// # Errors
    /// [`SurfaceError::InputWidth`], [`SurfaceError::TooFewCompartments`] or
    /// [`SurfaceError::NotNormalized`] when the network does not fit the
    /// surface contract.
    pub fn new(net: Mlp) -> SurfaceResult<Self> {
        if net.input_size() != 1 {
            return Err(SurfaceError::InputWidth { found: net.input_size() });
        }
        if net.output_size() < 2 {
            return Err(SurfaceError::TooFewCompartments { found: net.output_size() });
        }
        if net.output_activation() != OutputActivation::Softmax {
            return Err(SurfaceError::NotNormalized);
        }
        Ok(SurfaceFitter { net })
    }

    /// Build a fresh surface network with `hidden` widths and
    /// `n_compartments` softmax outputs.
    pub fn build<B: NetworkBuilder>(
        builder: &mut B, n_compartments: usize, hidden: &[usize], activation: Activation,
    ) -> SurfaceResult<Self> {
        let mut widths = hidden.to_vec();
        widths.push(n_compartments);
        let net = builder.build(1, &widths, activation, OutputActivation::Softmax)?;
        SurfaceFitter::new(net)
    }

    pub fn n_compartments(&self) -> usize {
        self.net.output_size()
    }

    pub fn network(&self) -> &Mlp {
        &self.net
    }

    /// `u(t)` for every time, shape `(rows, n_compartments)`.
    pub fn evaluate(&self, time: ArrayView1<f64>) -> SurfaceResult<Array2<f64>> {
        let column = Self::time_column(time)?;
        Ok(self.net.forward(column.view())?)
    }

    /// `(u(t), du/dt)`, both shaped `(rows, n_compartments)`.
    pub fn evaluate_with_time_derivative(
        &self, time: ArrayView1<f64>,
    ) -> SurfaceResult<(Array2<f64>, Array2<f64>)> {
        let column = Self::time_column(time)?;
        let TangentOutput { output, mut tangents } =
            self.net.forward_with_tangents(column.view(), &[0])?;
        Ok((output, tangents.swap_remove(0)))
    }

    fn time_column(time: ArrayView1<f64>) -> SurfaceResult<Array2<f64>> {
        if time.is_empty() {
            return Err(SurfaceError::EmptyBatch);
        }
        if let Some((index, &value)) = time.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(SurfaceError::NonFiniteTime { index, value });
        }
        Ok(time.to_owned().insert_axis(Axis(1)))
    }
}

impl Parameterized for SurfaceFitter {
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

#[cfg(test)]
mod tests {
    //! Tests for the surface fitter.
    //!
    //! Covered: simplex rows over a sweep of times, derivative agreement with
    //! finite differences, NaN rejection, construction contract.
    use super::*;
    use crate::network::mlp::MlpBuilder;
    use ndarray::{array, Array1};

    fn fitter() -> SurfaceFitter {
        SurfaceFitter::build(&mut MlpBuilder::seeded(21), 9, &[16, 16], Activation::Relu).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Every output row lies on the probability simplex.
    //
    // Given
    // -----
    // 101 times spanning [-1, 2] (beyond the normalized domain on purpose).
    //
    // Expect
    // ------
    // Entries in [0, 1], rows sum to 1 within 1e-12.
    fn rows_lie_on_simplex() {
        // Arrange
        let f = fitter();
        let t = Array1::linspace(-1.0, 2.0, 101);

        // Act
        let u = f.evaluate(t.view()).unwrap();

        // Assert
        assert_eq!(u.dim(), (101, 9));
        for row in u.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    // Purpose
    // -------
    // `du/dt` agrees with central finite differences and each row sums to 0.
    //
    // Given
    // -----
    // A tanh surface and four times in (0, 1).
    //
    // Expect
    // ------
    // Max abs error below 1e-6; derivative rows sum to ~0.
    fn time_derivative_matches_finite_differences() {
        // Arrange
        let f = SurfaceFitter::build(&mut MlpBuilder::seeded(4), 8, &[12], Activation::Tanh).unwrap();
        let t = array![0.05, 0.3, 0.61, 0.97];
        let h = 1e-6;

        // Act
        let (u, du) = f.evaluate_with_time_derivative(t.view()).unwrap();
        let up = f.evaluate((&t + h).view()).unwrap();
        let down = f.evaluate((&t - h).view()).unwrap();
        let numeric = (up - down) / (2.0 * h);

        // Assert
        assert_eq!(u, f.evaluate(t.view()).unwrap());
        let err = (&du - &numeric).mapv(f64::abs).fold(0.0_f64, |m, v| m.max(*v));
        assert!(err < 1e-6, "max err {err}");
        for row in du.axis_iter(Axis(0)) {
            assert!(row.sum().abs() < 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-finite times surface as validation errors, not NaN outputs.
    //
    // Given
    // -----
    // [0.1, NaN] and [inf].
    //
    // Expect
    // ------
    // `NonFiniteTime` with the offending index.
    fn non_finite_times_are_rejected() {
        let f = fitter();
        assert!(matches!(
            f.evaluate(array![0.1, f64::NAN].view()),
            Err(SurfaceError::NonFiniteTime { index: 1, .. })
        ));
        assert!(matches!(
            f.evaluate_with_time_derivative(array![f64::INFINITY].view()),
            Err(SurfaceError::NonFiniteTime { index: 0, .. })
        ));
        assert_eq!(f.evaluate(Array1::zeros(0).view()), Err(SurfaceError::EmptyBatch));
    }

    #[test]
    // Purpose
    // -------
    // Construction rejects networks that cannot be a surface.
    //
    // Given
    // -----
    // A sigmoid-output network over one input.
    //
    // Expect
    // ------
    // `NotNormalized`.
    fn construction_requires_softmax() {
        let net = MlpBuilder::seeded(0)
            .build(1, &[4, 9], Activation::Relu, OutputActivation::Sigmoid)
            .unwrap();
        assert_eq!(SurfaceFitter::new(net), Err(SurfaceError::NotNormalized));
    }
}
