//! Flat parameter access for trainable components.
//!
//! Training works on a single `Array1<f64>` parameter vector. Components
//! expose their weights through [`Parameterized`]; composite models
//! concatenate their parts in a fixed order and split the vector back on
//! [`Parameterized::set_parameters`].
//!
//! Layout for an [`Mlp`]: layer by layer, each layer's weights in row-major
//! `(fan_out, fan_in)` order followed by its bias.
use ndarray::{s, Array1, ArrayView1};

use crate::network::{
    errors::{NetworkError, NetworkResult},
    mlp::Mlp,
};

/// A component with a flat, ordered trainable parameter vector.
pub trait Parameterized {
    fn num_parameters(&self) -> usize;

    /// Copy of the current parameters in canonical order.
    fn parameters(&self) -> Array1<f64>;

    /// Overwrite all parameters from `theta`.
    ///
    /// # Errors
    /// [`NetworkError::ParameterLengthMismatch`] when `theta.len()` differs
    /// from [`num_parameters`](Self::num_parameters), and
    /// [`NetworkError::NonFiniteParameter`] for NaN/±inf entries. On error
    /// the component is left unchanged.
    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()>;
}

/// Validate length and finiteness of a flat parameter vector.
pub fn check_parameters(theta: ArrayView1<f64>, expected: usize) -> NetworkResult<()> {
    if theta.len() != expected {
        return Err(NetworkError::ParameterLengthMismatch { expected, found: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(NetworkError::NonFiniteParameter { index, value });
    }
    Ok(())
}

/// Concatenate the parameters of `parts` in order.
pub fn concatenate_parameters(parts: &[&dyn Parameterized]) -> Array1<f64> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.num_parameters()).sum());
    for part in parts {
        out.extend(part.parameters().iter().copied());
    }
    Array1::from(out)
}

/// Split `theta` across `parts` in order, each taking `num_parameters()` values.
///
/// The whole vector is validated before any part is written.
pub fn distribute_parameters(
    theta: ArrayView1<f64>, parts: &mut [&mut dyn Parameterized],
) -> NetworkResult<()> {
    let expected = parts.iter().map(|p| p.num_parameters()).sum();
    check_parameters(theta, expected)?;
    let mut offset = 0;
    for part in parts.iter_mut() {
        let n = part.num_parameters();
        part.set_parameters(theta.slice(s![offset..offset + n]))?;
        offset += n;
    }
    Ok(())
}

impl Parameterized for Mlp {
    fn num_parameters(&self) -> usize {
        self.layers().iter().map(|l| l.weights.len() + l.bias.len()).sum()
    }

    fn parameters(&self) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.num_parameters());
        for layer in self.layers() {
            out.extend(layer.weights.iter().copied());
            out.extend(layer.bias.iter().copied());
        }
        Array1::from(out)
    }

    fn set_parameters(&mut self, theta: ArrayView1<f64>) -> NetworkResult<()> {
        check_parameters(theta, self.num_parameters())?;
        let mut values = theta.iter().copied();
        for layer in self.layers_mut() {
            // `iter_mut` on owned arrays visits elements in logical row-major order.
            for (w, v) in layer.weights.iter_mut().zip(values.by_ref()) {
                *w = v;
            }
            for (b, v) in layer.bias.iter_mut().zip(values.by_ref()) {
                *b = v;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{
        activations::{Activation, OutputActivation},
        mlp::{MlpBuilder, NetworkBuilder},
    };
    use ndarray::array;

    fn tiny() -> Mlp {
        MlpBuilder::seeded(11).build(2, &[3, 1], Activation::Tanh, OutputActivation::Sigmoid).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Parameter count and layout follow (weights, bias) per layer.
    //
    // Given
    // -----
    // A 2→3→1 network.
    //
    // Expect
    // ------
    // 2·3 + 3 + 3·1 + 1 = 13 parameters; the first six are layer-0 weights
    // in row-major order.
    fn layout_is_layer_major_weights_then_bias() {
        let net = tiny();
        let theta = net.parameters();

        assert_eq!(net.num_parameters(), 13);
        assert_eq!(theta.len(), 13);
        let w0 = &net.layers()[0].weights;
        assert_eq!(theta[0], w0[[0, 0]]);
        assert_eq!(theta[1], w0[[0, 1]]);
        assert_eq!(theta[2], w0[[1, 0]]);
        assert_eq!(theta[6], net.layers()[0].bias[0]);
    }

    #[test]
    // Purpose
    // -------
    // Concatenation and distribution are inverse over several parts.
    //
    // Given
    // -----
    // Two networks and the reversed concatenation of their parameters.
    //
    // Expect
    // ------
    // Each network receives its own slice; a short vector is rejected
    // before either network changes.
    fn distribute_splits_in_order() {
        // Arrange
        let mut a = tiny();
        let mut b = MlpBuilder::seeded(12)
            .build(1, &[2, 2], Activation::Relu, OutputActivation::Softmax)
            .unwrap();
        let joint = concatenate_parameters(&[&a, &b]);
        let reversed: Array1<f64> = joint.iter().rev().copied().collect();

        // Act
        distribute_parameters(reversed.view(), &mut [&mut a, &mut b]).unwrap();
        let before = a.parameters();
        let short = distribute_parameters(reversed.slice(s![1..]), &mut [&mut a, &mut b]);

        // Assert
        let n = a.num_parameters();
        assert_eq!(joint.len(), n + b.num_parameters());
        assert_eq!(a.parameters(), reversed.slice(s![..n]));
        assert_eq!(b.parameters(), reversed.slice(s![n..]));
        assert!(matches!(short, Err(NetworkError::ParameterLengthMismatch { .. })));
        assert_eq!(a.parameters(), before);
    }

    #[test]
    // Purpose
    // -------
    // Writing parameters changes the network's output; bad vectors are
    // rejected without modifying the network.
    //
    // Given
    // -----
    // All-zero parameters, then a short vector and a NaN vector.
    //
    // Expect
    // ------
    // Zero network outputs sigmoid(0) = 0.5; errors leave it unchanged.
    fn set_parameters_updates_and_validates() {
        // Arrange
        let mut net = tiny();
        let x = array![[0.4, -1.3]];

        // Act
        net.set_parameters(Array1::zeros(13).view()).unwrap();
        let zeroed = net.forward(x.view()).unwrap();
        let short = net.set_parameters(Array1::zeros(12).view());
        let mut bad = Array1::zeros(13);
        bad[4] = f64::NAN;
        let nan = net.set_parameters(bad.view());

        // Assert
        assert!((zeroed[[0, 0]] - 0.5).abs() < 1e-15);
        assert_eq!(short, Err(NetworkError::ParameterLengthMismatch { expected: 13, found: 12 }));
        assert!(matches!(nan, Err(NetworkError::NonFiniteParameter { index: 4, .. })));
        assert!(net.parameters().iter().all(|v| *v == 0.0));
    }
}
