//! The gradient engine: forward and backward propagation over a
//! fixed-topology feed-forward network.
//!
//! Both a single-example path (vectors) and a batched path (matrices whose
//! columns are examples) are provided. Every forward pass caches the
//! weighted inputs `z_k` and activations `a_k` required by backward
//! propagation; backward propagation walks the layers in reverse using the
//! zero-copy transposed view of each weight matrix.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;

use crate::error::NetworkError;
use crate::functions::{Activation, Cost};
use crate::math::matrix::{self, Matrix, MatrixView};
use crate::math::vector;

/// Batched elementwise kernels switch to the fork-join map above this
/// element count.
const PAR_LEN_THRESHOLD: usize = 4096;

/// A labeled training example. The engine only ever reads the two
/// vectors; how they were produced is the loader's concern.
pub trait Example {
    fn input(&self) -> &[f64];
    fn output(&self) -> &[f64];
}

/// Weight and bias tensors for an `L`-layer topology: `weights[k]` has
/// shape `(layers[k+1], layers[k])` and `biases[k]` has length
/// `layers[k+1]`. Created once, mutated in place by the trainer, never
/// resized.
#[derive(Clone, Debug)]
pub struct Network {
    pub weights: Vec<Matrix>,
    pub biases: Vec<Vec<f64>>,
}

/// Per-parameter gradient estimate, one entry per weight/bias tensor.
#[derive(Clone, Debug)]
pub struct Gradients {
    pub weights: Vec<Matrix>,
    pub biases: Vec<Vec<f64>>,
}

impl Gradients {
    /// Zero gradients shaped like `net`'s parameter tensors.
    pub fn zeros_like(net: &Network) -> Self {
        Gradients {
            weights: net
                .weights
                .iter()
                .map(|w| Matrix::zeros(w.nrows(), w.ncols()))
                .collect(),
            biases: net.biases.iter().map(|b| vec![0.0; b.len()]).collect(),
        }
    }

    /// Elementwise accumulation of another gradient estimate.
    pub fn accumulate(&mut self, other: &Gradients) {
        for (w, ow) in self.weights.iter_mut().zip(&other.weights) {
            *w = matrix::add(w, ow);
        }
        for (b, ob) in self.biases.iter_mut().zip(&other.biases) {
            *b = vector::add(b, ob);
        }
    }

    /// Uniform scaling, used to turn an accumulated sum into an average.
    pub fn scale(&mut self, x: f64) {
        for w in &mut self.weights {
            *w = w.scale(x);
        }
        for b in &mut self.biases {
            *b = vector::scale(b, x);
        }
    }
}

/// `z = W*a + b` for one layer.
fn weighted_input(w: &Matrix, a: &[f64], b: &[f64]) -> Vec<f64> {
    vector::add(&matrix::mat_vec(w, a), b)
}

/// Elementwise kernel over a batch matrix, parallel for large batches.
fn elementwise(m: &Matrix, f: fn(f64) -> f64) -> Matrix {
    if m.len() >= PAR_LEN_THRESHOLD {
        m.par_mapv(f)
    } else {
        m.mapv(f)
    }
}

impl Network {
    /// Random network for the given layer sizes. Weight entries are
    /// Gaussian, scaled by `1/sqrt(fan-in)` to control initial activation
    /// variance; the rng is threaded explicitly so fixed seeds reproduce.
    pub fn new(layers: &[usize], rng: &mut impl Rng) -> Result<Self, NetworkError> {
        if layers.len() < 2 {
            return Err(NetworkError::TooFewLayers(layers.len()));
        }

        let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
        let mut weights = Vec::with_capacity(layers.len() - 1);
        let mut biases = Vec::with_capacity(layers.len() - 1);

        for k in 0..layers.len() - 1 {
            let scale = 1.0 / (layers[k] as f64).sqrt();
            weights.push(Matrix::from_fn(layers[k + 1], layers[k], |_, _| {
                normal.sample(rng) * scale
            }));
            biases.push((0..layers[k + 1]).map(|_| normal.sample(rng)).collect());
        }

        Ok(Network { weights, biases })
    }

    pub fn num_layers(&self) -> usize {
        self.weights.len() + 1
    }

    /// Forward pass for one example, returning the output activation.
    pub fn forward(&self, input: &[f64], activation: &Activation) -> Vec<f64> {
        let mut a = input.to_vec();
        for (w, b) in self.weights.iter().zip(&self.biases) {
            a = vector::map(&weighted_input(w, &a, b), activation.value);
        }
        a
    }

    /// Forward pass caching every weighted input `z_k` and activation
    /// `a_k` (including the input itself), as required by backward
    /// propagation.
    pub fn propagate(&self, input: &[f64], activation: &Activation) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut zs = Vec::with_capacity(self.weights.len());
        let mut activations = vec![input.to_vec()];

        for (w, b) in self.weights.iter().zip(&self.biases) {
            let z = weighted_input(w, activations.last().map_or(input, Vec::as_slice), b);
            activations.push(vector::map(&z, activation.value));
            zs.push(z);
        }

        (zs, activations)
    }

    /// Batched forward pass: columns of `inputs` are separate examples.
    /// The bias vector is broadcast-added to every column before the
    /// activation is applied elementwise.
    pub fn propagate_batch(
        &self,
        inputs: &Matrix,
        activation: &Activation,
    ) -> (Vec<Matrix>, Vec<Matrix>) {
        let mut zs = Vec::with_capacity(self.weights.len());
        let mut activations = vec![inputs.clone()];

        for (w, b) in self.weights.iter().zip(&self.biases) {
            let z = matrix::mat_mat(w, activations.last().unwrap_or(inputs))
                .mapv_indexed(|i, _, v| v + b[i]);
            activations.push(elementwise(&z, activation.value));
            zs.push(z);
        }

        (zs, activations)
    }

    /// Batched forward pass returning only the output activations.
    pub fn forward_batch(&self, inputs: &Matrix, activation: &Activation) -> Matrix {
        let (_, mut activations) = self.propagate_batch(inputs, activation);
        activations
            .pop()
            .unwrap_or_else(|| inputs.clone())
    }

    /// Backward propagation for one example: the output-layer error is
    /// `cost.prime(a_L, desired) ⊙ activation.prime(z_L)`, then each
    /// earlier delta is `(W_{l+1}^T · delta_{l+1}) ⊙ activation.prime(z_l)`
    /// using the transposed view (no copy). Bias gradients equal the
    /// deltas; weight gradients are `outer(delta_l, a_{l-1})`.
    pub fn backprop<E: Example + ?Sized>(
        &self,
        example: &E,
        activation: &Activation,
        cost: &Cost,
    ) -> Gradients {
        let (zs, activations) = self.propagate(example.input(), activation);
        let last = self.weights.len() - 1;

        let mut grads = Gradients::zeros_like(self);

        let actual = &activations[last + 1];
        let mut delta = vector::mul(
            &vector::zip(actual, example.output(), cost.prime),
            &vector::map(&zs[last], activation.prime),
        );
        grads.weights[last] = vector::outer(&delta, &activations[last]);
        grads.biases[last] = delta.clone();

        for l in (0..last).rev() {
            let wt = self.weights[l + 1].transpose();
            delta = vector::mul(
                &matrix::mat_vec(&wt, &delta),
                &vector::map(&zs[l], activation.prime),
            );
            grads.weights[l] = vector::outer(&delta, &activations[l]);
            grads.biases[l] = delta.clone();
        }

        grads
    }

    /// Batched backward propagation. The output error is computed
    /// per-column; weight gradients use the column-wise outer-product
    /// average and bias gradients the row-wise average, so the returned
    /// gradients are already the mini-batch mean with no post-hoc
    /// division.
    pub fn backprop_batch(
        &self,
        inputs: &Matrix,
        desired: &Matrix,
        activation: &Activation,
        cost: &Cost,
    ) -> Gradients {
        let (zs, activations) = self.propagate_batch(inputs, activation);
        let last = self.weights.len() - 1;

        let mut grads = Gradients::zeros_like(self);

        let actual = &activations[last + 1];
        let mut delta = matrix::hadamard(
            &matrix::zip_with(actual, desired, cost.prime),
            &elementwise(&zs[last], activation.prime),
        );
        grads.weights[last] = matrix::outer_col_avg(&delta, &activations[last]);
        grads.biases[last] = matrix::row_avg(&delta);

        for l in (0..last).rev() {
            let wt = self.weights[l + 1].transpose();
            delta = matrix::hadamard(
                &matrix::mat_mat(&wt, &delta),
                &elementwise(&zs[l], activation.prime),
            );
            grads.weights[l] = matrix::outer_col_avg(&delta, &activations[l]);
            grads.biases[l] = matrix::row_avg(&delta);
        }

        grads
    }
}
