//! Dense multilayer perceptron with exact first-order input derivatives.
//!
//! Purpose
//! -------
//! Provide the single network type used by every learned component: the
//! surface fitter and the three rate functions. An [`Mlp`] maps a
//! `(rows, inputs)` batch to a `(rows, outputs)` batch and can propagate
//! forward-mode tangents alongside the forward pass.
//!
//! Key behaviors
//! -------------
//! - Layer `i` computes `z = h_{i-1} · Wᵢᵀ + bᵢ` with `Wᵢ` stored as
//!   `(fan_out, fan_in)`. Hidden layers apply [`Activation`]; the last layer
//!   applies [`OutputActivation`].
//! - [`Mlp::forward_with_tangents`] seeds one unit tangent per requested
//!   input column and pushes each through the same layers, giving
//!   `∂output/∂input[:, k]` for every row without finite differencing.
//!   Rows are independent, so the tangent of a row depends only on that row.
//! - [`MlpBuilder`] draws weights and biases from `U(−1/√fan_in, 1/√fan_in)`
//!   using a seeded `StdRng`, so identical seeds give identical networks.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least one layer; consecutive layers chain (`fan_out(i-1) == fan_in(i)`).
//! - Every evaluation validates width and finiteness of the batch first.
//!
//! Downstream usage
//! ----------------
//! - `surface::SurfaceFitter` wraps a softmax-output network with one input.
//! - `rates::RateFunction` wraps a sigmoid-output network with one output.
//! - Flat parameter access lives in `network::parameters`.
use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::network::{
    activations::{Activation, OutputActivation},
    errors::{NetworkError, NetworkResult},
};

/// One fully connected layer: `weights` is `(fan_out, fan_in)`, `bias` is `fan_out`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f64>,
    pub bias: Array1<f64>,
}

impl DenseLayer {
    pub fn fan_in(&self) -> usize {
        self.weights.ncols()
    }

    pub fn fan_out(&self) -> usize {
        self.weights.nrows()
    }

    fn affine(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut z = x.dot(&self.weights.t());
        z += &self.bias;
        z
    }

    fn linear(&self, dx: ArrayView2<f64>) -> Array2<f64> {
        dx.dot(&self.weights.t())
    }
}

/// Forward output together with one tangent block per requested input column.
///
/// `tangents[k][[r, j]] = ∂output[[r, j]] / ∂input[[r, columns[k]]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentOutput {
    pub output: Array2<f64>,
    pub tangents: Vec<Array2<f64>>,
}

/// Feed-forward network.
#[derive(Debug, Clone, PartialEq)]
pub struct Mlp {
    layers: Vec<DenseLayer>,
    activation: Activation,
    output_activation: OutputActivation,
}

impl Mlp {
    /// Assemble a network from explicit layers.
    ///
    /// # Errors
    /// - [`NetworkError::NoLayers`] when `layers` is empty.
    /// - [`NetworkError::ZeroWidth`] when a layer has zero inputs or outputs.
    /// - [`NetworkError::BiasLengthMismatch`] / [`NetworkError::LayerChainMismatch`]
    ///   when the shapes do not line up.
    pub fn from_layers(
        layers: Vec<DenseLayer>, activation: Activation, output_activation: OutputActivation,
    ) -> NetworkResult<Self> {
        if layers.is_empty() {
            return Err(NetworkError::NoLayers);
        }
        for (index, layer) in layers.iter().enumerate() {
            if layer.fan_in() == 0 || layer.fan_out() == 0 {
                return Err(NetworkError::ZeroWidth { index });
            }
            if layer.bias.len() != layer.fan_out() {
                return Err(NetworkError::BiasLengthMismatch {
                    index,
                    expected: layer.fan_out(),
                    found: layer.bias.len(),
                });
            }
            if index > 0 {
                let previous = layers[index - 1].fan_out();
                if previous != layer.fan_in() {
                    return Err(NetworkError::LayerChainMismatch {
                        index,
                        expected: layer.fan_in(),
                        found: previous,
                    });
                }
            }
        }
        Ok(Mlp { layers, activation, output_activation })
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].fan_in()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].fan_out()
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn output_activation(&self) -> OutputActivation {
        self.output_activation
    }

    /// Evaluate the network on a `(rows, input_size)` batch.
    ///
    /// # Errors
    /// Input validation errors; see [`NetworkError`].
    pub fn forward(&self, input: ArrayView2<f64>) -> NetworkResult<Array2<f64>> {
        self.validate_input(input)?;
        let last = self.layers.len() - 1;
        let mut h = input.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = layer.affine(h.view());
            if i < last {
                let act = self.activation;
                z.mapv_inplace(|v| act.apply(v));
            } else {
                self.output_activation.apply_rows(&mut z);
            }
            h = z;
        }
        Ok(h)
    }

    /// Evaluate the network and the exact derivative of every output with
    /// respect to each input column listed in `columns`.
    ///
    /// # Errors
    /// - Input validation errors; see [`NetworkError`].
    /// - [`NetworkError::ColumnOutOfRange`] for a column `>= input_size`.
    pub fn forward_with_tangents(
        &self, input: ArrayView2<f64>, columns: &[usize],
    ) -> NetworkResult<TangentOutput> {
        self.validate_input(input)?;
        let width = self.input_size();
        if let Some(&column) = columns.iter().find(|&&c| c >= width) {
            return Err(NetworkError::ColumnOutOfRange { column, width });
        }

        let rows = input.nrows();
        let mut tangents: Vec<Array2<f64>> = columns
            .iter()
            .map(|&c| {
                let mut seed = Array2::zeros((rows, width));
                seed.column_mut(c).fill(1.0);
                seed
            })
            .collect();

        let last = self.layers.len() - 1;
        let mut h = input.to_owned();
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.affine(h.view());
            let mut next: Vec<Array2<f64>> =
                tangents.iter().map(|t| layer.linear(t.view())).collect();
            if i < last {
                let act = self.activation;
                let out = z.mapv(|v| act.apply(v));
                let slope = Zip::from(&z).and(&out).map_collect(|&zv, &hv| act.slope(zv, hv));
                for t in next.iter_mut() {
                    *t *= &slope;
                }
                h = out;
            } else {
                let mut out = z;
                self.output_activation.apply_rows(&mut out);
                for t in next.iter_mut() {
                    self.output_activation.push_tangent(out.view(), t);
                }
                h = out;
            }
            tangents = next;
        }
        Ok(TangentOutput { output: h, tangents })
    }

    fn validate_input(&self, input: ArrayView2<f64>) -> NetworkResult<()> {
        if input.nrows() == 0 {
            return Err(NetworkError::EmptyBatch);
        }
        if input.ncols() != self.input_size() {
            return Err(NetworkError::InputWidthMismatch {
                expected: self.input_size(),
                found: input.ncols(),
            });
        }
        if let Some(((row, col), &value)) = input.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(NetworkError::NonFiniteInput { row, col, value });
        }
        Ok(())
    }
}

/// Exact derivatives of a network's outputs with respect to its inputs.
pub trait ExactDerivative {
    /// `∂output/∂input[:, column]` evaluated row by row, shape `(rows, outputs)`.
    ///
    /// # Errors
    /// [`NetworkError::UnsupportedOrder`] for `order != 1`, plus the input
    /// validation errors of the implementor.
    fn derivative(
        &self, input: ArrayView2<f64>, column: usize, order: usize,
    ) -> NetworkResult<Array2<f64>>;
}

impl ExactDerivative for Mlp {
    fn derivative(
        &self, input: ArrayView2<f64>, column: usize, order: usize,
    ) -> NetworkResult<Array2<f64>> {
        if order != 1 {
            return Err(NetworkError::UnsupportedOrder { order });
        }
        let TangentOutput { mut tangents, .. } = self.forward_with_tangents(input, &[column])?;
        Ok(tangents.swap_remove(0))
    }
}

/// Constructs initialized networks from a layer description.
pub trait NetworkBuilder {
    /// Build a network taking `input_size` features through `layer_sizes`.
    ///
    /// `layer_sizes` lists each hidden width followed by the output width,
    /// so `[256, 1]` is one hidden layer of 256 units and a scalar output.
    fn build(
        &mut self, input_size: usize, layer_sizes: &[usize], activation: Activation,
        output_activation: OutputActivation,
    ) -> NetworkResult<Mlp>;
}

/// Seeded builder drawing `U(−1/√fan_in, 1/√fan_in)` weights and biases.
#[derive(Debug, Clone)]
pub struct MlpBuilder {
    rng: StdRng,
}

impl MlpBuilder {
    pub fn seeded(seed: u64) -> Self {
        MlpBuilder { rng: StdRng::seed_from_u64(seed) }
    }
}

impl NetworkBuilder for MlpBuilder {
    fn build(
        &mut self, input_size: usize, layer_sizes: &[usize], activation: Activation,
        output_activation: OutputActivation,
    ) -> NetworkResult<Mlp> {
        if layer_sizes.is_empty() {
            return Err(NetworkError::NoLayers);
        }
        if input_size == 0 {
            return Err(NetworkError::ZeroWidth { index: 0 });
        }
        if let Some(pos) = layer_sizes.iter().position(|&w| w == 0) {
            return Err(NetworkError::ZeroWidth { index: pos + 1 });
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut fan_in = input_size;
        for &fan_out in layer_sizes {
            let bound = 1.0 / (fan_in as f64).sqrt();
            let rng = &mut self.rng;
            let weights =
                Array2::from_shape_simple_fn((fan_out, fan_in), || rng.random_range(-bound..bound));
            let bias = Array1::from_shape_simple_fn(fan_out, || rng.random_range(-bound..bound));
            layers.push(DenseLayer { weights, bias });
            fan_in = fan_out;
        }
        debug!(input_size, ?layer_sizes, ?activation, ?output_activation, "built network");
        Mlp::from_layers(layers, activation, output_activation)
    }
}
