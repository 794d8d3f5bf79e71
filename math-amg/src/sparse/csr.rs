//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value, increasing within a row
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Besides the usual products, the matrix exposes the row-wise queries the
//! AMG setup is written against: off-diagonal iteration, diagonal lookup and
//! whether a row is unconnected.

use crate::traits::{ComplexField, LinearOperator};
use ndarray::{Array1, Array2};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Row count above which the row kernels go parallel (with the `rayon` feature)
#[cfg(feature = "rayon")]
const PARALLEL_MATVEC_ROWS: usize = 4096;

/// Compressed Sparse Row (CSR) matrix format
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T: ComplexField> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrMatrix<T> {
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

    /// Create a CSR matrix from raw components
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent:
    /// - `row_ptrs` must have length `num_rows + 1`
    /// - `col_indices` and `values` must have the same length
    /// - `row_ptrs[num_rows]` must equal `values.len()`
    pub fn from_raw_parts(
        num_rows: usize,
        num_cols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        assert_eq!(
            row_ptrs.len(),
            num_rows + 1,
            "row_ptrs must have num_rows + 1 elements"
        );
        assert_eq!(
            col_indices.len(),
            values.len(),
            "col_indices and values must have the same length"
        );
        assert_eq!(
            row_ptrs[num_rows],
            values.len(),
            "row_ptrs[num_rows] must equal nnz"
        );

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from a dense matrix, keeping entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let mut builder = CsrBuilder::new(dense.nrows(), dense.ncols());
        for row in dense.rows() {
            builder.add_row_entries(
                row.iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, v)| v.norm() > threshold),
            );
        }
        builder.finish()
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        triplets.sort_by_key(|&(row, col, _)| (row, col));

        let mut row_ptrs = vec![0usize; num_rows + 1];
        let mut col_indices: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(
                row < num_rows && col < num_cols,
                "triplet ({row}, {col}) outside {num_rows}x{num_cols}"
            );
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            col_indices.push(col);
            values.push(val);
            row_ptrs[row + 1] += 1;
            last = Some((row, col));
        }

        for i in 0..num_rows {
            row_ptrs[i + 1] += row_ptrs[i];
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of stored entries, nnz / (rows * cols)
    pub fn density(&self) -> f64 {
        let total = self.num_rows as f64 * self.num_cols as f64;
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
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

    /// Get the (col, value) pairs of a row, skipping the diagonal
    pub fn off_diagonal(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        self.row_entries(row).filter(move |&(col, _)| col != row)
    }

    /// `true` if the row stores no off-diagonal entry
    pub fn is_unconnected(&self, row: usize) -> bool {
        self.col_indices[self.row_range(row)]
            .iter()
            .all(|&col| col == row)
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => T::zero(),
        }
    }

    /// Diagonal entry of a row (0 if not stored)
    pub fn diagonal_value(&self, row: usize) -> T {
        self.get(row, row)
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        Array1::from_iter((0..n).map(|i| self.diagonal_value(i)))
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_rows, T::zero());
        self.matvec_into(x, &mut y);
        y
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &Array1<T>) -> T {
        let mut sum = T::zero();
        for idx in self.row_range(row) {
            sum += self.values[idx] * x[self.col_indices[idx]];
        }
        sum
    }

    /// Apply `f(row, &mut y[row])` to every row
    ///
    /// Runs on the rayon pool when the `rayon` feature is enabled and the
    /// matrix has at least `PARALLEL_MATVEC_ROWS` rows.
    fn for_each_row<F>(&self, y: &mut Array1<T>, f: F)
    where
        F: Fn(usize, &mut T) + Send + Sync,
    {
        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= PARALLEL_MATVEC_ROWS {
                if let Some(out) = y.as_slice_mut() {
                    out.par_iter_mut().enumerate().for_each(|(i, yi)| f(i, yi));
                    return;
                }
            }
        }

        for (i, yi) in y.iter_mut().enumerate() {
            f(i, yi);
        }
    }

    /// Matrix-vector product into an existing buffer: y = A * x
    pub fn matvec_into(&self, x: &Array1<T>, y: &mut Array1<T>) {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        assert_eq!(y.len(), self.num_rows, "Output vector size mismatch");

        self.for_each_row(y, |i, yi| *yi = self.row_dot(i, x));
    }

    /// Matrix-vector product with accumulation: y += A * x
    pub fn matvec_add(&self, x: &Array1<T>, y: &mut Array1<T>) {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        assert_eq!(y.len(), self.num_rows, "Output vector size mismatch");

        self.for_each_row(y, |i, yi| *yi += self.row_dot(i, x));
    }

    /// Residual into an existing buffer: r = b - A * x
    pub fn residual_into(&self, x: &Array1<T>, b: &Array1<T>, r: &mut Array1<T>) {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        assert_eq!(b.len(), self.num_rows, "Right-hand side size mismatch");
        assert_eq!(r.len(), self.num_rows, "Residual vector size mismatch");

        self.for_each_row(r, |i, ri| *ri = b[i] - self.row_dot(i, x));
    }

    /// Exact transpose (structure and values), columns sorted in every row
    pub fn transpose(&self) -> CsrMatrix<T> {
        let mut row_ptrs = vec![0usize; self.num_cols + 1];
        for &col in &self.col_indices {
            row_ptrs[col + 1] += 1;
        }
        for j in 0..self.num_cols {
            row_ptrs[j + 1] += row_ptrs[j];
        }

        let nnz = self.nnz();
        let mut next = row_ptrs.clone();
        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![T::zero(); nnz];

        // rows are visited in increasing order, so each transposed row stays sorted
        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                let dst = next[j];
                col_indices[dst] = i;
                values[dst] = self.values[idx];
                next[j] += 1;
            }
        }

        CsrMatrix {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for (j, val) in self.row_entries(i) {
                dense[[i, j]] = val;
            }
        }

        dense
    }
}

impl<T: ComplexField> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }
}

/// Builder for constructing CSR matrices row by row
///
/// Every call to [`CsrBuilder::add_row_entries`] sets the next row in one
/// go. Entries are stored exactly as given, explicit zeros included.
pub struct CsrBuilder<T: ComplexField> {
    num_rows: usize,
    num_cols: usize,
    values: Vec<T>,
    col_indices: Vec<usize>,
    row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrBuilder<T> {
    /// Create a new CSR builder
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self::with_capacity(num_rows, num_cols, 0)
    }

    /// Create a new CSR builder with estimated non-zeros
    pub fn with_capacity(num_rows: usize, num_cols: usize, nnz_estimate: usize) -> Self {
        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        Self {
            num_rows,
            num_cols,
            values: Vec::with_capacity(nnz_estimate),
            col_indices: Vec::with_capacity(nnz_estimate),
            row_ptrs,
        }
    }

    /// Index of the row the next call to `add_row_entries` will fill
    pub fn current_row(&self) -> usize {
        self.row_ptrs.len() - 1
    }

    /// Set the current row (entries must be in strictly increasing column order)
    pub fn add_row_entries(&mut self, entries: impl IntoIterator<Item = (usize, T)>) {
        assert!(
            self.current_row() < self.num_rows,
            "CsrBuilder: more than {} rows added",
            self.num_rows
        );
        let start = self.values.len();
        for (col, val) in entries {
            debug_assert!(col < self.num_cols, "column {col} out of range");
            debug_assert!(
                self.col_indices.len() == start || self.col_indices[self.col_indices.len() - 1] < col,
                "row entries must be sorted by column"
            );
            self.values.push(val);
            self.col_indices.push(col);
        }
        self.row_ptrs.push(self.values.len());
    }

    /// Finish building and return the CSR matrix; missing rows stay empty
    pub fn finish(mut self) -> CsrMatrix<T> {
        while self.row_ptrs.len() <= self.num_rows {
            self.row_ptrs.push(self.values.len());
        }

        CsrMatrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values: self.values,
            col_indices: self.col_indices,
            row_ptrs: self.row_ptrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    fn sample() -> CsrMatrix<f64> {
        // [ 4 -1  0 ]
        // [-1  4 -2 ]
        // [ 0  0  5 ]
        CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 4.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 4.0),
                (1, 2, -2.0),
                (2, 2, 5.0),
            ],
        )
    }

    #[test]
    fn test_csr_from_dense() {
        let dense = array![
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(2.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(3.0, 0.0), Complex64::new(0.0, 0.0)],
            [Complex64::new(4.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(5.0, 0.0)],
        ];

        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        assert_eq!(csr.nnz(), 5);
        assert_relative_eq!(csr.get(0, 2).re, 2.0);
        assert_relative_eq!(csr.get(2, 0).re, 4.0);
        assert_relative_eq!(csr.get(1, 0).norm(), 0.0);
    }

    #[test]
    fn test_csr_triplets_duplicate() {
        let triplets = vec![(1, 1, 3.0_f64), (0, 0, 1.0), (0, 0, 2.0)];
        let csr = CsrMatrix::from_triplets(3, 3, triplets);

        assert_eq!(csr.nnz(), 2);
        assert_relative_eq!(csr.get(0, 0), 3.0);
        assert_eq!(csr.row_ptrs, vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_row_queries() {
        let a = sample();

        let off: Vec<(usize, f64)> = a.off_diagonal(1).collect();
        assert_eq!(off, vec![(0, -1.0), (2, -2.0)]);
        assert_relative_eq!(a.diagonal_value(1), 4.0);
        assert!(!a.is_unconnected(0));
        assert!(a.is_unconnected(2));
        assert_relative_eq!(a.density(), 6.0 / 9.0);
    }

    #[test]
    fn test_matvec_variants() {
        let a = sample();
        let x = array![1.0_f64, 2.0, 3.0];

        let y = a.matvec(&x);
        assert_relative_eq!(y[0], 2.0);
        assert_relative_eq!(y[1], 1.0);
        assert_relative_eq!(y[2], 15.0);

        let mut acc = array![1.0_f64, 1.0, 1.0];
        a.matvec_add(&x, &mut acc);
        assert_relative_eq!(acc[2], 16.0);

        let b = array![2.0_f64, 2.0, 2.0];
        let mut r = Array1::zeros(3);
        a.residual_into(&x, &b, &mut r);
        assert_relative_eq!(r[0], 0.0);
        assert_relative_eq!(r[1], 1.0);
        assert_relative_eq!(r[2], -13.0);
    }

    #[test]
    fn test_large_row_kernels_agree() {
        // above the parallel threshold when built with `rayon`
        let n = 5000;
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0 + (i % 7) as f64));
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
                triplets.push((i + 1, i, -0.5));
            }
        }
        let a = CsrMatrix::from_triplets(n, n, triplets);
        let x = Array1::from_iter((0..n).map(|i| (i as f64 * 0.01).sin()));
        let b = Array1::from_iter((0..n).map(|i| (i % 3) as f64));

        let ax = a.matvec(&x);
        assert_relative_eq!(ax[0], 2.0 * x[0] - x[1]);
        assert_relative_eq!(ax[n - 1], -0.5 * x[n - 2] + (2.0 + ((n - 1) % 7) as f64) * x[n - 1]);

        let mut r = Array1::zeros(n);
        a.residual_into(&x, &b, &mut r);
        assert_eq!(r, &b - &ax);

        let mut acc = b.clone();
        a.matvec_add(&x, &mut acc);
        assert_eq!(acc, &b + &ax);
    }

    #[test]
    fn test_transpose_matches_dense() {
        let a = CsrMatrix::from_triplets(
            2,
            3,
            vec![(0, 2, 1.5_f64), (0, 0, -1.0), (1, 1, 2.0), (1, 2, 3.0)],
        );
        let t = a.transpose();

        assert_eq!(t.num_rows, 3);
        assert_eq!(t.num_cols, 2);
        assert_eq!(t.to_dense(), a.to_dense().t().to_owned());
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_builder_keeps_explicit_zero() {
        let mut builder: CsrBuilder<f64> = CsrBuilder::new(3, 3);
        builder.add_row_entries([(0, 0.0), (2, 1.0)]);
        assert_eq!(builder.current_row(), 1);
        builder.add_row_entries([(1, 3.0)]);
        let csr = builder.finish();

        assert_eq!(csr.nnz(), 3);
        assert_eq!(csr.row_range(2), 3..3);
        assert_relative_eq!(csr.get(1, 1), 3.0);
    }

    #[test]
    fn test_linear_operator_impl() {
        let a = sample();
        let y = LinearOperator::apply(&a, &array![1.0_f64, 0.0, 0.0]);
        assert_relative_eq!(y[1], -1.0);
        assert!(a.is_square());
    }
}
