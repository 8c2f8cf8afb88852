//! Activations for hidden and output layers, with their tangent maps.
//!
//! Purpose
//! -------
//! Provide the scalar nonlinearities used between dense layers and the
//! row-wise output activations (identity, sigmoid, softmax), together with
//! the derivative information needed to push input tangents through them.
//!
//! Key behaviors
//! -------------
//! - [`Activation`] is applied elementwise to hidden pre-activations.
//!   [`Activation::slope`] returns `dh/dz` given both the pre-activation `z`
//!   and the activated value `h`, so callers never recompute the forward map.
//! - [`OutputActivation`] is applied to the final layer. Softmax normalizes
//!   each row, so its tangent couples all outputs of a row:
//!   `dp = p ⊙ (dz − Σ_j p_j dz_j)`.
//! - Logistic and softplus use the guarded forms below, which avoid
//!   `exp` overflow for large `|z|`.
//!
//! Conventions
//! -----------
//! - Batches are `(rows, features)`; output activations work row by row.
//! - Identifiers parsed from strings are case-insensitive.
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::network::errors::NetworkError;

/// Hidden-layer activation applied elementwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Softplus,
}

impl Activation {
    /// Forward map `h = φ(z)`.
    pub fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Tanh => z.tanh(),
            Activation::Sigmoid => safe_logistic(z),
            Activation::Softplus => safe_softplus(z),
        }
    }

    /// Derivative `dφ/dz` evaluated at pre-activation `z` with output `h = φ(z)`.
    ///
    /// ReLU uses the subgradient `0` at `z == 0`.
    pub fn slope(self, z: f64, h: f64) -> f64 {
        match self {
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => 1.0 - h * h,
            Activation::Sigmoid => h * (1.0 - h),
            Activation::Softplus => safe_logistic(z),
        }
    }
}

impl FromStr for Activation {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" | "logistic" => Ok(Activation::Sigmoid),
            "softplus" => Ok(Activation::Softplus),
            _ => Err(NetworkError::UnknownActivation { name: s.to_string() }),
        }
    }
}

/// Output-layer activation applied to each row of the final pre-activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputActivation {
    Identity,
    /// Elementwise logistic; maps every output into `(0, 1)`.
    Sigmoid,
    /// Row-wise softmax; each output row is nonnegative and sums to 1.
    Softmax,
}

impl OutputActivation {
    /// Apply the activation in place to a `(rows, outputs)` pre-activation block.
    pub fn apply_rows(self, z: &mut Array2<f64>) {
        match self {
            OutputActivation::Identity => {}
            OutputActivation::Sigmoid => z.mapv_inplace(safe_logistic),
            OutputActivation::Softmax => {
                for mut row in z.axis_iter_mut(Axis(0)) {
                    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    row.mapv_inplace(|v| (v - max).exp());
                    let total = row.sum();
                    row.mapv_inplace(|v| v / total);
                }
            }
        }
    }

    /// Map a pre-activation tangent `dz` to the output tangent `dy`, in place.
    ///
    /// `output` must be the already activated block returned by
    /// [`apply_rows`](Self::apply_rows) for the same pre-activations.
    pub fn push_tangent(self, output: ArrayView2<f64>, tangent: &mut Array2<f64>) {
        match self {
            OutputActivation::Identity => {}
            OutputActivation::Sigmoid => {
                Zip::from(tangent).and(output).for_each(|dz, &y| *dz *= y * (1.0 - y));
            }
            OutputActivation::Softmax => {
                for (mut dz, p) in tangent.axis_iter_mut(Axis(0)).zip(output.axis_iter(Axis(0))) {
                    let inner: f64 = dz.iter().zip(p.iter()).map(|(d, q)| d * q).sum();
                    Zip::from(&mut dz).and(&p).for_each(|d, &q| *d = q * (*d - inner));
                }
            }
        }
    }
}

/// Numerically stable logistic `1 / (1 + exp(-x))`.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softplus `ln(1 + exp(x))`.
///
/// For `x > 20` the result is `x` to machine precision.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

#[cfg(test)]
mod tests {
    //! Tests for activation maps and their tangents.
    //!
    //! Covered:
    //! - slopes agree with central differences of `apply`,
    //! - softmax rows are normalized and its tangent sums to zero per row,
    //! - parsing is case-insensitive and rejects unknown names.
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify each hidden activation's slope matches a numerical derivative.
    //
    // Given
    // -----
    // A handful of pre-activation values away from the ReLU kink.
    //
    // Expect
    // ------
    // |slope − (φ(z+h) − φ(z−h)) / 2h| < 1e-6.
    fn slopes_match_central_difference() {
        // Arrange
        let points = [-3.5, -0.7, 0.4, 2.2];
        let h = 1e-6;

        for act in [Activation::Relu, Activation::Tanh, Activation::Sigmoid, Activation::Softplus] {
            for &z in &points {
                // Act
                let numeric = (act.apply(z + h) - act.apply(z - h)) / (2.0 * h);
                let exact = act.slope(z, act.apply(z));

                // Assert
                assert!((numeric - exact).abs() < 1e-6, "{act:?} at {z}: {numeric} vs {exact}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure softmax rows sum to one and tangents stay on the simplex plane.
    //
    // Given
    // -----
    // A 2×3 block with large logits (overflow-prone without the max shift).
    //
    // Expect
    // ------
    // Each output row sums to 1; each pushed tangent row sums to 0.
    fn softmax_rows_normalize_and_tangents_sum_to_zero() {
        // Arrange
        let mut z = array![[800.0, 801.0, 799.0], [-2.0, 0.0, 3.0]];
        let mut dz = array![[1.0, -0.5, 2.0], [0.3, 0.3, -1.0]];

        // Act
        OutputActivation::Softmax.apply_rows(&mut z);
        OutputActivation::Softmax.push_tangent(z.view(), &mut dz);

        // Assert
        for row in z.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|v| v.is_finite() && *v >= 0.0));
        }
        for row in dz.axis_iter(Axis(0)) {
            assert!(row.sum().abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Check identifier parsing.
    //
    // Given
    // -----
    // Mixed-case known names and one unknown name.
    //
    // Expect
    // ------
    // Known names parse; the unknown name yields `UnknownActivation`.
    fn activation_parsing_is_case_insensitive() {
        assert_eq!("ReLU".parse::<Activation>(), Ok(Activation::Relu));
        assert_eq!("TANH".parse::<Activation>(), Ok(Activation::Tanh));
        assert!(matches!(
            "swish".parse::<Activation>(),
            Err(NetworkError::UnknownActivation { .. })
        ));
    }
}
