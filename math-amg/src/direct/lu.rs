//! LU decomposition solver
//!
//! Dense LU factorization with partial pivoting, used as the direct solver
//! on the coarsest level of the hierarchy. The coarse operator is small by
//! construction, so densifying it is cheap compared to the setup.

use crate::error::{AmgError, Result};
use crate::sparse::CsrMatrix;
use crate::traits::{CoarseSolver, ComplexField};
use ndarray::{Array1, Array2};
use num_traits::{Float, FromPrimitive, One, Zero};

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: ComplexField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Row swapped with row k at elimination step k
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: ComplexField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    ///
    /// # Panics
    ///
    /// Panics if `b` does not have length `n`.
    pub fn solve(&self, b: &Array1<T>) -> Array1<T> {
        assert_eq!(b.len(), self.n, "Right-hand side size mismatch");
        let mut x = b.clone();

        // Apply row permutations in elimination order
        for (k, &pivot) in self.pivots.iter().enumerate() {
            if pivot != k {
                x.swap(k, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                x[i] = x[i] - l_ij * x[j];
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                x[i] = x[i] - u_ij * x[j];
            }
            x[i] *= self.lu[[i, i]].inv();
        }

        x
    }
}

/// Compute LU factorization with partial pivoting
///
/// A pivot below `n * ε * max|a_ij|` is reported as
/// [`AmgError::SingularCoarseMatrix`].
///
/// # Panics
///
/// Panics if `a` is not square.
pub fn lu_factorize<T: ComplexField>(a: &Array2<T>) -> Result<LuFactorization<T>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "LU factorization needs a square matrix");

    let scale = a
        .iter()
        .map(|v| v.norm())
        .fold(T::Real::zero(), |acc, v| acc.max(v));
    let tol = scale * T::Real::from_usize(n.max(1)).unwrap_or_else(T::Real::one) * T::Real::epsilon();

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].norm();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].norm();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val <= tol {
            return Err(AmgError::SingularCoarseMatrix);
        }

        // Swap rows if needed
        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
        }
        pivots[k] = max_row;

        // Compute multipliers and eliminate
        let pivot_inv = lu[[k, k]].inv();
        for i in (k + 1)..n {
            let mult = lu[[i, k]] * pivot_inv;
            lu[[i, k]] = mult; // Store multiplier in L part

            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: ComplexField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>> {
    Ok(lu_factorize(a)?.solve(b))
}

impl<T: ComplexField> CoarseSolver<T> for LuFactorization<T> {
    fn factorize(matrix: &CsrMatrix<T>) -> Result<Self> {
        lu_factorize(&matrix.to_dense())
    }

    fn solve(&self, b: &Array1<T>, x: &mut Array1<T>) -> Result<()> {
        x.assign(&LuFactorization::solve(self, b));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_lu_solve_real() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0],];

        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        // Verify: Ax = b
        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_solve_complex() {
        let a = array![
            [Complex64::new(4.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(3.0, -1.0)],
        ];

        let b = array![Complex64::new(1.0, 1.0), Complex64::new(2.0, -1.0)];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!((ax[i] - b[i]).norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_needs_pivoting() {
        // zero leading entry and a chain of row swaps
        let a = array![[0.0_f64, 1.0, 2.0], [0.0, 0.0, 3.0], [4.0, 5.0, 6.0]];
        let b = array![3.0_f64, 3.0, 15.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0],]; // Singular matrix

        let b = array![1.0_f64, 2.0];

        let result = lu_solve(&a, &b);
        assert!(matches!(result, Err(AmgError::SingularCoarseMatrix)));
    }

    #[test]
    fn test_coarse_solver_from_csr() {
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 4.0_f64),
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 1, 3.0),
                (1, 2, 1.0),
                (2, 1, 1.0),
                (2, 2, 2.0),
            ],
        );

        let solver = <LuFactorization<f64> as CoarseSolver<f64>>::factorize(&a).unwrap();

        // Solve multiple RHS with one factorization
        for b in [array![1.0_f64, 2.0, 3.0], array![4.0_f64, 5.0, 6.0]] {
            let mut x = Array1::zeros(3);
            CoarseSolver::solve(&solver, &b, &mut x).unwrap();
            let ax = a.matvec(&x);
            for i in 0..3 {
                assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
            }
        }
    }
}
