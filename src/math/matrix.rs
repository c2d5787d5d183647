//! 2-D numeric container with row-major and column-major backing storage
//! and a zero-copy transposed view.
//!
//! Three representations share one logical contract, expressed by the
//! [`MatrixView`] trait: an owning [`Matrix`] in either layout, and a
//! [`Transposed`] wrapper that swaps the meaning of row/col/shape without
//! copying. Performance-critical elementwise kernels iterate the row-major
//! buffer returned by `data()` instead of dispatching `at(i, j)` per
//! element.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use crate::math::vector;
use crate::parallel;

/// Branch factor handed to the fork-join map by [`Matrix::par_mapv`]
/// (2^2 = 4 concurrent threads).
const PAR_BRANCH: u32 = 2;

/// Physical ordering of the flat backing buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    RowMajor,
    ColMajor,
}

/// Common read contract over every matrix representation.
pub trait MatrixView {
    /// `(rows, cols)` as seen by the caller.
    fn shape(&self) -> (usize, usize);

    /// Element read; panics when `i >= rows` or `j >= cols`.
    fn at(&self, i: usize, j: usize) -> f64;

    /// Row `i` as an owned vector of length `cols`.
    fn row(&self, i: usize) -> Vec<f64>;

    /// Column `j` as an owned vector of length `rows`.
    fn col(&self, j: usize) -> Vec<f64>;

    /// Row-major flattened contents. Borrowed when the backing storage is
    /// already row-major, materialized in O(rows*cols) otherwise.
    fn data(&self) -> Cow<'_, [f64]>;

    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    layout: Layout,
}

impl Matrix {
    /// Build from a flat buffer plus explicit shape and layout.
    pub fn from_shape_vec(
        shape: (usize, usize),
        data: Vec<f64>,
        layout: Layout,
    ) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(ShapeError {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            layout,
        })
    }

    /// Build row-major from a nested literal. Panics when rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n * m);
        for row in rows {
            assert_eq!(row.len(), m, "all rows must have the same length");
            data.extend_from_slice(row);
        }
        Self {
            data,
            rows: n,
            cols: m,
            layout: Layout::RowMajor,
        }
    }

    /// Row-major matrix with every element produced by `f(i, j)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self {
            data,
            rows,
            cols,
            layout: Layout::RowMajor,
        }
    }

    /// Zero-filled row-major matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
            layout: Layout::RowMajor,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(i < self.rows, "row index {} out of bounds ({})", i, self.rows);
        assert!(j < self.cols, "col index {} out of bounds ({})", j, self.cols);
        match self.layout {
            Layout::RowMajor => i * self.cols + j,
            Layout::ColMajor => j * self.rows + i,
        }
    }

    /// Mutable element access. Aliasable through [`TransposedMut`]: writes
    /// made through a view land in this matrix's storage.
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let offset = self.offset(i, j);
        &mut self.data[offset]
    }

    /// O(1) read-only transposed view over this matrix's storage.
    pub fn transpose(&self) -> Transposed<'_> {
        Transposed { inner: self }
    }

    /// O(1) mutable transposed view; writes at `(i, j)` land at `(j, i)`.
    pub fn transpose_mut(&mut self) -> TransposedMut<'_> {
        TransposedMut { inner: self }
    }

    /// Elementwise map over the row-major buffer, producing a new
    /// row-major matrix.
    pub fn mapv(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            data: self.data().iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
            layout: Layout::RowMajor,
        }
    }

    /// Elementwise map routed through the fork-join primitive; identical
    /// output to [`Matrix::mapv`] for any pure `f`.
    pub fn par_mapv(&self, f: impl Fn(f64) -> f64 + Sync) -> Matrix {
        Matrix {
            data: parallel::parallel_map(&self.data(), PAR_BRANCH, f),
            rows: self.rows,
            cols: self.cols,
            layout: Layout::RowMajor,
        }
    }

    /// Index-aware elementwise map: `f` receives `(i, j, value)`. Used for
    /// broadcasting a bias vector over every column of a batch.
    pub fn mapv_indexed(&self, f: impl Fn(usize, usize, f64) -> f64) -> Matrix {
        let data = self.data();
        let mut out = Vec::with_capacity(data.len());
        for (idx, &v) in data.iter().enumerate() {
            out.push(f(idx / self.cols, idx % self.cols, v));
        }
        Matrix {
            data: out,
            rows: self.rows,
            cols: self.cols,
            layout: Layout::RowMajor,
        }
    }

    /// Uniform scalar scaling.
    pub fn scale(&self, x: f64) -> Matrix {
        self.mapv(|v| v * x)
    }
}

impl MatrixView for Matrix {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.data[self.offset(i, j)]
    }

    fn row(&self, i: usize) -> Vec<f64> {
        assert!(i < self.rows, "row index {} out of bounds ({})", i, self.rows);
        match self.layout {
            Layout::RowMajor => self.data[i * self.cols..(i + 1) * self.cols].to_vec(),
            Layout::ColMajor => (0..self.cols).map(|j| self.data[j * self.rows + i]).collect(),
        }
    }

    fn col(&self, j: usize) -> Vec<f64> {
        assert!(j < self.cols, "col index {} out of bounds ({})", j, self.cols);
        match self.layout {
            Layout::RowMajor => (0..self.rows).map(|i| self.data[i * self.cols + j]).collect(),
            Layout::ColMajor => self.data[j * self.rows..(j + 1) * self.rows].to_vec(),
        }
    }

    fn data(&self) -> Cow<'_, [f64]> {
        match self.layout {
            Layout::RowMajor => Cow::Borrowed(&self.data),
            Layout::ColMajor => {
                let mut out = vec![0.0; self.data.len()];
                for j in 0..self.cols {
                    for i in 0..self.rows {
                        out[i * self.cols + j] = self.data[j * self.rows + i];
                    }
                }
                Cow::Owned(out)
            }
        }
    }
}

/// Read-only transposed view. Never owns storage; the borrow ties its
/// lifetime to the viewed matrix, so a stale view cannot outlive or
/// observe a reshaped owner.
#[derive(Clone, Copy, Debug)]
pub struct Transposed<'a> {
    inner: &'a Matrix,
}

impl<'a> Transposed<'a> {
    /// Transposing the view yields the original matrix.
    pub fn transpose(&self) -> &'a Matrix {
        self.inner
    }
}

impl MatrixView for Transposed<'_> {
    fn shape(&self) -> (usize, usize) {
        let (r, c) = self.inner.shape();
        (c, r)
    }

    fn at(&self, i: usize, j: usize) -> f64 {
        self.inner.at(j, i)
    }

    fn row(&self, i: usize) -> Vec<f64> {
        self.inner.col(i)
    }

    fn col(&self, j: usize) -> Vec<f64> {
        self.inner.row(j)
    }

    fn data(&self) -> Cow<'_, [f64]> {
        let (rows, cols) = self.shape();
        let mut out = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                out.push(self.inner.at(j, i));
            }
        }
        Cow::Owned(out)
    }
}

/// Mutable transposed view; `at_mut(i, j)` aliases the owner's `(j, i)`.
#[derive(Debug)]
pub struct TransposedMut<'a> {
    inner: &'a mut Matrix,
}

impl TransposedMut<'_> {
    pub fn shape(&self) -> (usize, usize) {
        let (r, c) = self.inner.shape();
        (c, r)
    }

    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.inner.at(j, i)
    }

    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        self.inner.at_mut(j, i)
    }
}

/// Combine two equal-shape matrices elementwise with `f`.
pub fn zip_with<A: MatrixView, B: MatrixView>(
    a: &A,
    b: &B,
    f: impl Fn(f64, f64) -> f64,
) -> Matrix {
    assert_eq!(
        a.shape(),
        b.shape(),
        "elementwise matrix op requires equal shapes"
    );
    let (rows, cols) = a.shape();
    let data = a
        .data()
        .iter()
        .zip(b.data().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Matrix {
        data,
        rows,
        cols,
        layout: Layout::RowMajor,
    }
}

pub fn add<A: MatrixView, B: MatrixView>(a: &A, b: &B) -> Matrix {
    zip_with(a, b, |x, y| x + y)
}

pub fn sub<A: MatrixView, B: MatrixView>(a: &A, b: &B) -> Matrix {
    zip_with(a, b, |x, y| x - y)
}

/// Elementwise (Hadamard) product.
pub fn hadamard<A: MatrixView, B: MatrixView>(a: &A, b: &B) -> Matrix {
    zip_with(a, b, |x, y| x * y)
}

/// Matrix-vector product built from row dot products. Panics when the
/// matrix column count differs from the vector length.
pub fn mat_vec<M: MatrixView>(m: &M, v: &[f64]) -> Vec<f64> {
    (0..m.nrows()).map(|i| vector::dot(&m.row(i), v)).collect()
}

/// Matrix-matrix product. Panics when `a.cols != b.rows`.
pub fn mat_mat<A: MatrixView, B: MatrixView>(a: &A, b: &B) -> Matrix {
    assert_eq!(
        a.ncols(),
        b.nrows(),
        "inner dimensions of matrix product do not match"
    );
    let cols: Vec<Vec<f64>> = (0..b.ncols()).map(|j| b.col(j)).collect();
    Matrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        vector::dot(&a.row(i), &cols[j])
    })
}

/// Collapse the columns of `m` into one averaged value per row.
pub fn row_avg<M: MatrixView>(m: &M) -> Vec<f64> {
    assert!(m.ncols() > 0, "row average requires at least one column");
    let n = m.ncols() as f64;
    (0..m.nrows()).map(|i| vector::sum(&m.row(i)) / n).collect()
}

/// Average of the outer products of corresponding columns of `a` and `b`:
/// the mini-batch weight-gradient reduction, folding the batch average
/// into a single pass.
pub fn outer_col_avg<A: MatrixView, B: MatrixView>(a: &A, b: &B) -> Matrix {
    assert_eq!(
        a.ncols(),
        b.ncols(),
        "column-wise outer average requires equal column counts"
    );
    let n = a.ncols();
    let mut out = Matrix::zeros(a.nrows(), b.nrows());
    for j in 0..n {
        let ca = a.col(j);
        let cb = b.col(j);
        for (i, &x) in ca.iter().enumerate() {
            for (k, &y) in cb.iter().enumerate() {
                *out.at_mut(i, k) += x * y;
            }
        }
    }
    out.scale(1.0 / n as f64)
}

/// Flat buffer length inconsistent with the requested shape.
#[derive(Debug, Clone)]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    len: usize,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid shape ({}, {}) for buffer of length {}",
            self.rows, self.cols, self.len
        )
    }
}

impl Error for ShapeError {}
