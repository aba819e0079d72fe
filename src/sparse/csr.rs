//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts

use crate::traits::{DiagonalAccess, LinearOperator, RealScalar};
use ndarray::{Array1, Array2};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Row count above which the parallel matvec pays for its overhead
#[cfg(feature = "rayon")]
const PARALLEL_ROW_THRESHOLD: usize = 256;

/// Compressed Sparse Row (CSR) matrix
///
/// Memory-efficient storage for sparse matrices with O(nnz) space.
/// Matrix-vector products are O(nnz) instead of O(n^2) for dense matrices.
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: RealScalar> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i;
    /// row_ptrs[num_rows] equals nnz
    pub row_ptrs: Vec<usize>,
}

impl<T: RealScalar> CsrMatrix<T> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix with pre-allocated capacity
    pub fn with_capacity(num_rows: usize, num_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::with_capacity(nnz_estimate),
            col_indices: Vec::with_capacity(nnz_estimate),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.abs() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_ptrs = vec![0usize; num_rows + 1];

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);

                if row != prev_row {
                    let start = if prev_row == usize::MAX {
                        0
                    } else {
                        prev_row + 1
                    };
                    for item in row_ptrs.iter_mut().take(row + 1).skip(start) {
                        *item = values.len() - 1;
                    }
                }

                prev_row = row;
                prev_col = col;
            }
        }

        let last_row = if prev_row == usize::MAX {
            0
        } else {
            prev_row + 1
        };
        for item in row_ptrs.iter_mut().take(num_rows + 1).skip(last_row) {
            *item = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create an identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Create a diagonal matrix from a vector
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sparsity ratio (fraction of non-zero entries)
    pub fn sparsity(&self) -> f64 {
        let total = self.num_rows * self.num_cols;
        if total == 0 {
            0.0
        } else {
            self.nnz() as f64 / total as f64
        }
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        for idx in self.row_range(i) {
            if self.col_indices[idx] == j {
                return self.values[idx];
            }
        }
        T::zero()
    }

    /// Matrix-vector product: y = A * x
    ///
    /// Uses parallel processing when the `rayon` feature is enabled and the
    /// matrix is large enough to benefit from it.
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= PARALLEL_ROW_THRESHOLD {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_rows, T::zero());

        for i in 0..self.num_rows {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                sum += self.values[idx] * x[j];
            }
            y[i] = sum;
        }

        y
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<T>) -> Array1<T> {
        let x_slice = x.as_slice().expect("Array should be contiguous");

        let results: Vec<T> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| {
                let mut sum = T::zero();
                for idx in self.row_range(i) {
                    let j = self.col_indices[idx];
                    sum += self.values[idx] * x_slice[j];
                }
                sum
            })
            .collect();

        Array1::from_vec(results)
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::from_elem(self.num_cols, T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                y[j] += self.values[idx] * x[i];
            }
        }

        y
    }

    /// Convert to a dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                dense[[i, j]] = self.values[idx];
            }
        }

        dense
    }
}

impl<T: RealScalar> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec_transpose(x)
    }
}

impl<T: RealScalar> DiagonalAccess<T> for CsrMatrix<T> {
    fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        Array1::from_iter((0..n).map(|i| self.get(i, i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_from_dense_and_matvec() {
        let dense = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let matrix = CsrMatrix::from_dense(&dense, 1e-15);

        assert_eq!(matrix.nnz(), 5);

        let x = array![1.0_f64, 2.0, 3.0];
        let y = matrix.matvec(&x);
        assert_relative_eq!(y[0], 6.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 7.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let matrix = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0_f64), (0, 0, 2.0), (1, 1, 4.0), (0, 1, 0.5)],
        );

        assert_relative_eq!(matrix.get(0, 0), 3.0);
        assert_relative_eq!(matrix.get(0, 1), 0.5);
        assert_relative_eq!(matrix.get(1, 0), 0.0);
        assert_relative_eq!(matrix.get(1, 1), 4.0);
    }

    #[test]
    fn test_matvec_transpose() {
        let dense = array![[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let matrix = CsrMatrix::from_dense(&dense, 1e-15);

        let x = array![1.0_f64, 1.0];
        let y = matrix.matvec_transpose(&x);
        assert_relative_eq!(y[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 7.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let matrix: CsrMatrix<f64> = CsrMatrix::identity(3);
        assert_eq!(matrix.nnz(), 3);

        let diag = matrix.diagonal();
        for i in 0..3 {
            assert_relative_eq!(diag[i], 1.0);
        }

        let x = array![1.0_f64, 2.0, 3.0];
        let y = matrix.matvec(&x);
        for i in 0..3 {
            assert_relative_eq!(y[i], x[i]);
        }
    }

    #[test]
    fn test_to_dense_round_trip() {
        let dense = array![[0.0_f64, 1.5], [2.5, 0.0]];
        let matrix = CsrMatrix::from_dense(&dense, 1e-15);
        let back = matrix.to_dense();

        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(back[[i, j]], dense[[i, j]]);
            }
        }
    }

    #[test]
    fn test_sparsity() {
        let dense = array![[1.0_f64, 0.0], [0.0, 1.0]];
        let matrix = CsrMatrix::from_dense(&dense, 1e-15);
        assert_relative_eq!(matrix.sparsity(), 0.5);
    }
}
