//! Dense feed-forward networks on `ndarray`
//!
//! This module provides the layer primitives shared by the actor and the
//! critic: fully connected layers, activations, a batched forward pass that
//! records the intermediate activations, and the matching backward pass.
//! Inputs are row-major batches `[batch, features]`.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Elementwise activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// No activation (linear output)
    Identity,
    /// `max(0, x)`
    Relu,
    /// `tanh(x)`, bounded in `[-1, 1]`
    Tanh,
}

impl Activation {
    fn apply(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Identity => z.clone(),
            Self::Relu => z.mapv(|v| v.max(0.0)),
            Self::Tanh => z.mapv(f64::tanh),
        }
    }

    /// Gradient with respect to the pre-activation `z`, given the gradient
    /// with respect to the activation output `a`.
    fn backward(self, grad: &Array2<f64>, z: &Array2<f64>, a: &Array2<f64>) -> Array2<f64> {
        match self {
            Self::Identity => grad.clone(),
            Self::Relu => Zip::from(grad)
                .and(z)
                .map_collect(|&g, &z| if z > 0.0 { g } else { 0.0 }),
            Self::Tanh => Zip::from(grad)
                .and(a)
                .map_collect(|&g, &a| g * (1.0 - a * a)),
        }
    }
}

/// Fully connected layer `y = x W + b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// Weights, shape `[in, out]`
    pub weight: Array2<f64>,
    /// Bias, shape `[out]`
    pub bias: Array1<f64>,
}

impl Linear {
    /// Layer with weights and bias drawn uniformly from `[-limit, limit]`
    pub fn uniform<R: Rng + ?Sized>(in_dim: usize, out_dim: usize, limit: f64, rng: &mut R) -> Self {
        let weight = Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..=limit));
        let bias = Array1::from_shape_fn(out_dim, |_| rng.gen_range(-limit..=limit));
        Self { weight, bias }
    }

    /// Number of input features
    #[must_use]
    pub fn in_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Number of output features
    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.weight.ncols()
    }

    fn forward(&self, x: &ArrayView2<f64>) -> Array2<f64> {
        x.dot(&self.weight) + &self.bias
    }
}

/// MLP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer sizes
    pub hidden_dims: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
    /// Activation applied after every hidden layer
    pub hidden_activation: Activation,
    /// Activation applied to the output layer
    pub output_activation: Activation,
    /// Half-width of the uniform initialisation of the output layer
    pub init_w: f64,
}

impl MlpConfig {
    /// Initialise a network.
    ///
    /// Hidden layers are drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, the
    /// output layer from `U(-init_w, init_w)` so that initial outputs stay
    /// close to zero.
    pub fn init<R: Rng + ?Sized>(&self, rng: &mut R) -> Mlp {
        let mut layers = Vec::with_capacity(self.hidden_dims.len() + 1);
        let mut prev_dim = self.input_dim;
        for &hidden_dim in &self.hidden_dims {
            let limit = 1.0 / (prev_dim.max(1) as f64).sqrt();
            layers.push(Linear::uniform(prev_dim, hidden_dim, limit, rng));
            prev_dim = hidden_dim;
        }
        layers.push(Linear::uniform(prev_dim, self.output_dim, self.init_w, rng));

        Mlp {
            layers,
            hidden_activation: self.hidden_activation,
            output_activation: self.output_activation,
        }
    }
}

/// Multi-layer perceptron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    /// Layers, input first
    pub layers: Vec<Linear>,
    /// Activation after hidden layers
    pub hidden_activation: Activation,
    /// Activation after the output layer
    pub output_activation: Activation,
}

/// Intermediate values of a forward pass, consumed by [`Mlp::backward`]
#[derive(Debug, Clone)]
pub struct ForwardCache {
    /// `activations[0]` is the input, `activations[l + 1]` the output of layer `l`
    activations: Vec<Array2<f64>>,
    /// Pre-activation values of every layer
    pre_activations: Vec<Array2<f64>>,
}

/// Gradient of one [`Linear`] layer
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGrad {
    /// Gradient with respect to the weights
    pub weight: Array2<f64>,
    /// Gradient with respect to the bias
    pub bias: Array1<f64>,
}

/// Parameter gradients of a whole [`Mlp`], ordered like its layers
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    /// Per-layer gradients
    pub layers: Vec<LinearGrad>,
}

impl Mlp {
    /// Number of input features
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Linear::in_dim)
    }

    /// Number of output features
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, Linear::out_dim)
    }

    /// Whether `other` has the same layer shapes and activations
    #[must_use]
    pub fn same_architecture(&self, other: &Self) -> bool {
        self.hidden_activation == other.hidden_activation
            && self.output_activation == other.output_activation
            && self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| {
                a.weight.dim() == b.weight.dim() && a.bias.len() == b.bias.len()
            })
    }

    fn activation(&self, layer: usize) -> Activation {
        if layer + 1 == self.layers.len() {
            self.output_activation
        } else {
            self.hidden_activation
        }
    }

    /// Batched forward pass
    #[must_use]
    pub fn forward(&self, input: ArrayView2<f64>) -> Array2<f64> {
        let mut x = input.to_owned();
        for (l, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&x.view());
            x = self.activation(l).apply(&z);
        }
        x
    }

    /// Forward pass that keeps what [`Mlp::backward`] needs
    #[must_use]
    pub fn forward_cached(&self, input: ArrayView2<f64>) -> (Array2<f64>, ForwardCache) {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        activations.push(input.to_owned());

        for (l, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&activations[l].view());
            let a = self.activation(l).apply(&z);
            pre_activations.push(z);
            activations.push(a);
        }

        let output = activations.last().cloned().unwrap_or_else(|| input.to_owned());
        (
            output,
            ForwardCache {
                activations,
                pre_activations,
            },
        )
    }

    /// Backpropagate `grad_output` (gradient of the loss with respect to the
    /// network output, `[batch, out]`).
    ///
    /// Returns the parameter gradients and the gradient with respect to the
    /// input (`[batch, in]`). Parameters are not modified.
    #[must_use]
    pub fn backward(&self, cache: &ForwardCache, grad_output: Array2<f64>) -> (Gradients, Array2<f64>) {
        let mut grad = grad_output;
        let mut layers = Vec::with_capacity(self.layers.len());

        for (l, layer) in self.layers.iter().enumerate().rev() {
            let delta = self.activation(l).backward(
                &grad,
                &cache.pre_activations[l],
                &cache.activations[l + 1],
            );
            layers.push(LinearGrad {
                weight: cache.activations[l].t().dot(&delta),
                bias: delta.sum_axis(Axis(0)),
            });
            grad = delta.dot(&layer.weight.t());
        }
        layers.reverse();

        (Gradients { layers }, grad)
    }

    /// Total number of scalar parameters
    #[must_use]
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.weight.len() + l.bias.len()).sum()
    }

    /// Flattened parameters: each layer's weights (row-major) then its bias
    #[must_use]
    pub fn parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.num_parameters());
        for layer in &self.layers {
            params.extend(layer.weight.iter().copied());
            params.extend(layer.bias.iter().copied());
        }
        params
    }
}
