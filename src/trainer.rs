//! Mini-batch stochastic gradient descent.
//!
//! Two interchangeable execution strategies satisfy the same per-batch
//! contract: [`Sgd::run`] accumulates per-example gradients and divides by
//! the batch size, while [`Sgd::run_batched`] stacks each batch into two
//! column-per-example matrices and lets the batched engine fold the
//! average into its reductions. Given the same shuffle both converge to
//! the same update up to floating-point rounding.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::functions::{Activation, Cost};
use crate::math::matrix::{self, Matrix};
use crate::math::vector;
use crate::network::{Example, Gradients, Network};

/// Hyper-parameters for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdConfig {
    /// Learning rate.
    pub eta: f64,
    pub epochs: usize,
    /// Only full batches are processed; a trailing remainder is silently
    /// dropped from that epoch, so the example count should be a multiple
    /// of this.
    pub mini_batch_size: usize,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            eta: 3.0,
            epochs: 30,
            mini_batch_size: 10,
        }
    }
}

/// Mini-batch SGD over a live [`Network`].
pub struct Sgd {
    pub activation: Activation,
    pub cost: Cost,
    pub config: SgdConfig,
}

impl Sgd {
    pub fn new(activation: Activation, cost: Cost, config: SgdConfig) -> Self {
        Self {
            activation,
            cost,
            config,
        }
    }

    /// Per-example path: accumulate single-example gradients over each
    /// batch and average by the batch size.
    pub fn run<E: Example>(&self, net: &mut Network, examples: &mut [E], rng: &mut impl Rng) {
        let m = self.config.mini_batch_size;
        info!(
            "sgd (per-example): {} examples, {} epochs, batch size {}, eta {}",
            examples.len(),
            self.config.epochs,
            m,
            self.config.eta
        );

        for epoch in 0..self.config.epochs {
            examples.shuffle(rng);
            for batch in examples.chunks_exact(m) {
                let mut total = Gradients::zeros_like(net);
                for example in batch {
                    total.accumulate(&net.backprop(example, &self.activation, &self.cost));
                }
                total.scale(1.0 / m as f64);
                apply_update(net, &total, self.config.eta);
            }
            debug!("epoch {} complete", epoch);
        }
    }

    /// Batched path: each batch becomes an input matrix and a desired
    /// matrix with one column per example; the engine returns gradients
    /// that are already the batch mean.
    pub fn run_batched<E: Example>(
        &self,
        net: &mut Network,
        examples: &mut [E],
        rng: &mut impl Rng,
    ) {
        let m = self.config.mini_batch_size;
        info!(
            "sgd (batched): {} examples, {} epochs, batch size {}, eta {}",
            examples.len(),
            self.config.epochs,
            m,
            self.config.eta
        );

        for epoch in 0..self.config.epochs {
            examples.shuffle(rng);
            for batch in examples.chunks_exact(m) {
                let (inputs, desired) = batch_to_matrices(batch);
                let grads = net.backprop_batch(&inputs, &desired, &self.activation, &self.cost);
                apply_update(net, &grads, self.config.eta);
            }
            debug!("epoch {} complete", epoch);
        }
    }
}

/// Stack a batch into `(inputs, desired)` matrices, one column per
/// example.
pub fn batch_to_matrices<E: Example>(batch: &[E]) -> (Matrix, Matrix) {
    assert!(!batch.is_empty(), "cannot build matrices from an empty batch");
    let n = batch.len();
    let input_size = batch[0].input().len();
    let output_size = batch[0].output().len();

    let mut inputs = Matrix::zeros(input_size, n);
    let mut desired = Matrix::zeros(output_size, n);

    for (j, example) in batch.iter().enumerate() {
        for (i, &v) in example.input().iter().enumerate() {
            *inputs.at_mut(i, j) = v;
        }
        for (i, &v) in example.output().iter().enumerate() {
            *desired.at_mut(i, j) = v;
        }
    }

    (inputs, desired)
}

/// In-place scaled gradient-descent step: `W -= eta * gradW`,
/// `b -= eta * gradB`.
fn apply_update(net: &mut Network, grads: &Gradients, eta: f64) {
    for (w, gw) in net.weights.iter_mut().zip(&grads.weights) {
        *w = matrix::sub(w, &gw.scale(eta));
    }
    for (b, gb) in net.biases.iter_mut().zip(&grads.biases) {
        *b = vector::sub(b, &vector::scale(gb, eta));
    }
}

/// Mean cost of the network's predictions over a dataset: the per-output
/// cost values are summed per example and averaged across examples.
/// Reporting only; not used by training.
pub fn mean_cost<E: Example>(
    net: &Network,
    examples: &[E],
    activation: &Activation,
    cost: &Cost,
) -> f64 {
    assert!(!examples.is_empty(), "cannot evaluate cost on an empty dataset");
    let total: f64 = examples
        .iter()
        .map(|e| {
            let actual = net.forward(e.input(), activation);
            vector::sum(&vector::zip(&actual, e.output(), cost.value))
        })
        .sum();
    total / examples.len() as f64
}

/// Count the examples whose forward output satisfies the pluggable
/// matcher predicate. Evaluation/reporting only.
pub fn evaluate<E: Example>(
    net: &Network,
    examples: &[E],
    activation: &Activation,
    matches: impl Fn(&[f64], &[f64]) -> bool,
) -> usize {
    examples
        .iter()
        .filter(|e| matches(&net.forward(e.input(), activation), e.output()))
        .count()
}
