//! Small linear-algebra layer used throughout the crate.
//!
//! Provides an owning [`Matrix`] with row-major and column-major storage, a
//! zero-copy [`Transposed`] view, and free-function elementwise/reduction
//! primitives over matrices and plain `f64` slices. Intentionally small
//! and easy to test; shape contracts are asserted at every call site.
pub mod matrix;
pub mod vector;

pub use matrix::{Layout, Matrix, MatrixView, ShapeError, Transposed, TransposedMut};
