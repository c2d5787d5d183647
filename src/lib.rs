//! ffnet: a small from-scratch numerical layer and feed-forward neural
//! network trained with mini-batch stochastic gradient descent.
//!
//! The crate is built leaves-first: a matrix/vector layer with zero-copy
//! transposed views (`math`), elementwise primitives with an optional
//! fork-join parallel map (`parallel`), a forward/backward gradient engine
//! over single examples or column-per-example batches (`network`), and an
//! SGD trainer with two interchangeable batch strategies (`trainer`).
//! Example data arrives through the IDX loader (`loader`); activations and
//! costs are plain (value, derivative) pairs (`functions`).
pub mod error;
pub mod functions;
pub mod loader;
pub mod math;
pub mod network;
pub mod parallel;
pub mod trainer;
