//! Model problems
//!
//! Finite-difference Laplacians used by the tests, the benchmark and the
//! `amg-poisson` binary. Grid nodes are numbered row by row, `k = row * n + col`.

use crate::sparse::{CsrBuilder, CsrMatrix};
use crate::traits::ComplexField;

fn real<T: ComplexField>(v: f64) -> T {
    T::from_real(T::real_from_f64(v))
}

/// Tridiagonal `[-1, 2, -1]` on `n` unknowns (Dirichlet ends)
pub fn laplacian_1d<T: ComplexField>(n: usize) -> CsrMatrix<T> {
    let mut builder = CsrBuilder::with_capacity(n, n, 3 * n);
    for i in 0..n {
        let mut row = Vec::with_capacity(3);
        if i > 0 {
            row.push((i - 1, real(-1.0)));
        }
        row.push((i, real(2.0)));
        if i + 1 < n {
            row.push((i + 1, real(-1.0)));
        }
        builder.add_row_entries(row);
    }
    builder.finish()
}

/// Five-point Laplacian on an `n × n` interior grid, Dirichlet boundary
/// eliminated (diagonal 4, neighbours -1)
pub fn poisson_2d<T: ComplexField>(n: usize) -> CsrMatrix<T> {
    five_point(n, |_| 4.0)
}

/// Five-point graph Laplacian on an `n × n` grid: the diagonal is the number
/// of grid neighbours, so every row sums to zero
pub fn neumann_poisson_2d<T: ComplexField>(n: usize) -> CsrMatrix<T> {
    five_point(n, |degree| degree as f64)
}

fn five_point<T: ComplexField>(n: usize, diagonal: impl Fn(usize) -> f64) -> CsrMatrix<T> {
    let size = n * n;
    let mut builder = CsrBuilder::with_capacity(size, size, 5 * size);

    for row in 0..n {
        for col in 0..n {
            let k = row * n + col;
            let mut neighbors = Vec::with_capacity(4);
            if row > 0 {
                neighbors.push(k - n);
            }
            if col > 0 {
                neighbors.push(k - 1);
            }
            if col + 1 < n {
                neighbors.push(k + 1);
            }
            if row + 1 < n {
                neighbors.push(k + n);
            }

            let diag = real(diagonal(neighbors.len()));
            let mut entries: Vec<(usize, T)> =
                neighbors.iter().map(|&j| (j, real(-1.0))).collect();
            entries.push((k, diag));
            entries.sort_by_key(|&(j, _)| j);
            builder.add_row_entries(entries);
        }
    }

    builder.finish()
}

/// Node coordinates of the `n × n` grid in the open unit square, spacing
/// `1 / (n + 1)`
pub fn grid_positions(n: usize) -> Vec<(f64, f64)> {
    let h = 1.0 / (n + 1) as f64;
    (0..n * n)
        .map(|k| (((k % n) + 1) as f64 * h, ((k / n) + 1) as f64 * h))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_poisson_2d_structure() {
        let a: CsrMatrix<f64> = poisson_2d(4);
        assert_eq!(a.num_rows, 16);
        // 16 diagonal entries plus 2 * (2 * 4 * 3) couplings
        assert_eq!(a.nnz(), 16 + 48);
        assert_eq!(a.get(5, 5), 4.0);
        assert_eq!(a.get(5, 1), -1.0);
        assert_eq!(a.get(5, 6), -1.0);
        assert_eq!(a.get(3, 4), 0.0);
        assert_eq!(a, a.transpose());
    }

    #[test]
    fn test_neumann_rows_sum_to_zero() {
        let a: CsrMatrix<f64> = neumann_poisson_2d(5);
        let ones = Array1::from_elem(25, 1.0);
        assert!(a.matvec(&ones).iter().all(|v| v.abs() < 1e-14));
        assert_eq!(a.get(0, 0), 2.0);
        assert_eq!(a.get(12, 12), 4.0);
    }

    #[test]
    fn test_laplacian_1d_and_positions() {
        let a: CsrMatrix<f64> = laplacian_1d(5);
        assert_eq!(a.nnz(), 13);
        assert_eq!(a.diagonal_value(4), 2.0);

        let pos = grid_positions(3);
        assert_eq!(pos.len(), 9);
        assert_eq!(pos[0], (0.25, 0.25));
        assert_eq!(pos[5], (0.75, 0.5));
    }
}
