//! Elementwise and reduction primitives over plain `f64` slices.
//!
//! Vectors are kept as `&[f64]` / `Vec<f64>`; every operation returns a
//! fresh buffer and never aliases its input. Length contracts are enforced
//! with assertions: mismatched operands are programmer errors, not
//! recoverable conditions.

use crate::math::matrix::Matrix;

/// Apply `f` to every element, producing a new vector.
pub fn map(v: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
    v.iter().map(|&x| f(x)).collect()
}

/// Combine two equal-length vectors elementwise with `f`.
pub fn zip(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    assert_eq!(
        a.len(),
        b.len(),
        "elementwise zip requires vectors of equal length"
    );
    a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect()
}

/// Left fold seeded with the first element.
pub fn reduce(v: &[f64], f: impl Fn(f64, f64) -> f64) -> f64 {
    assert!(!v.is_empty(), "cannot reduce an empty vector");
    v[1..].iter().fold(v[0], |acc, &x| f(acc, x))
}

/// Sum of all elements.
pub fn sum(v: &[f64]) -> f64 {
    reduce(v, |a, b| a + b)
}

/// Inner product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    sum(&zip(a, b, |x, y| x * y))
}

pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip(a, b, |x, y| x + y)
}

pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip(a, b, |x, y| x - y)
}

pub fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    zip(a, b, |x, y| x * y)
}

/// Uniform scalar scaling.
pub fn scale(v: &[f64], x: f64) -> Vec<f64> {
    map(v, |a| a * x)
}

/// Outer product: a `(a.len(), b.len())` row-major matrix with
/// `out[(i, j)] = a[i] * b[j]`.
pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
    Matrix::from_fn(a.len(), b.len(), |i, j| a[i] * b[j])
}
