//! Level smoothers
//!
//! [`LevelSmoother`] is the default [`Smoother`] of the hierarchy. It keeps
//! the inverted (l1-)diagonal of its level so a sweep never recomputes it.

use super::config::{AmgConfig, AmgSmoother};
use crate::error::Result;
use crate::sparse::CsrMatrix;
use crate::traits::{ComplexField, Smoother};
use crate::vector::vector_norm;
use ndarray::Array1;
use num_traits::Zero;

/// Default per-level relaxation
#[derive(Debug, Clone)]
pub struct LevelSmoother<T: ComplexField> {
    kind: AmgSmoother,
    /// Damping ω (Jacobi only)
    weight: T,
    /// Inverse of the diagonal, or of the l1 row sums for l1-Jacobi
    inv_diag: Array1<T>,
}

impl<T: ComplexField> LevelSmoother<T> {
    pub fn kind(&self) -> AmgSmoother {
        self.kind
    }

    fn jacobi_sweep(&self, matrix: &CsrMatrix<T>, x: &mut Array1<T>, b: &Array1<T>, r: &mut Array1<T>) {
        matrix.residual_into(x, b, r);
        for i in 0..x.len() {
            x[i] += self.weight * self.inv_diag[i] * r[i];
        }
    }

    fn gauss_seidel_update(&self, matrix: &CsrMatrix<T>, x: &mut Array1<T>, b: &Array1<T>, i: usize) {
        if self.inv_diag[i].is_zero() {
            return;
        }
        let mut sum = b[i];
        for (j, val) in matrix.off_diagonal(i) {
            sum -= val * x[j];
        }
        x[i] = sum * self.inv_diag[i];
    }
}

/// Inverse of `values[i]`, zero where the value vanishes
fn invert_or_skip<T: ComplexField>(values: impl Iterator<Item = T>) -> Array1<T> {
    let tol = T::real_from_f64(1e-15);
    values
        .map(|d| if d.is_zero_approx(tol) { T::zero() } else { d.inv() })
        .collect()
}

impl<T: ComplexField> Smoother<T> for LevelSmoother<T> {
    fn init(matrix: &CsrMatrix<T>, config: &AmgConfig) -> Result<Self> {
        let n = matrix.num_rows;
        let inv_diag = match config.smoother {
            AmgSmoother::L1Jacobi => invert_or_skip((0..n).map(|i| {
                let l1 = matrix
                    .row_entries(i)
                    .fold(T::Real::zero(), |acc, (_, v)| acc + v.norm());
                T::from_real(l1)
            })),
            AmgSmoother::Jacobi | AmgSmoother::SymmetricGaussSeidel => {
                invert_or_skip((0..n).map(|i| matrix.diagonal_value(i)))
            }
        };

        let weight = match config.smoother {
            AmgSmoother::Jacobi => T::from_real(T::real_from_f64(config.jacobi_weight)),
            _ => T::one(),
        };

        Ok(Self {
            kind: config.smoother,
            weight,
            inv_diag,
        })
    }

    fn smooth(
        &self,
        matrix: &CsrMatrix<T>,
        x: &mut Array1<T>,
        b: &Array1<T>,
        sweeps: usize,
        r: &mut Array1<T>,
    ) -> T::Real {
        let n = x.len();

        match self.kind {
            AmgSmoother::Jacobi | AmgSmoother::L1Jacobi => {
                for _ in 0..sweeps {
                    self.jacobi_sweep(matrix, x, b, r);
                }
            }
            AmgSmoother::SymmetricGaussSeidel => {
                for _ in 0..sweeps {
                    for i in 0..n {
                        self.gauss_seidel_update(matrix, x, b, i);
                    }
                    for i in (0..n).rev() {
                        self.gauss_seidel_update(matrix, x, b, i);
                    }
                }
            }
        }

        matrix.residual_into(x, b, r);
        vector_norm(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laplacian(n: usize) -> CsrMatrix<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i > 0 {
                triplets.push((i, i - 1, -1.0));
            }
            if i + 1 < n {
                triplets.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn test_smoothers_reduce_residual() {
        let a = laplacian(20);
        let b = Array1::from_elem(20, 1.0);

        for smoother in [
            AmgSmoother::Jacobi,
            AmgSmoother::L1Jacobi,
            AmgSmoother::SymmetricGaussSeidel,
        ] {
            let config = AmgConfig {
                smoother,
                ..Default::default()
            };
            let s = LevelSmoother::init(&a, &config).unwrap();
            assert_eq!(s.kind(), smoother);

            let mut x = Array1::zeros(20);
            let mut r = Array1::zeros(20);
            let r0 = vector_norm(&b);
            let r1 = s.smooth(&a, &mut x, &b, 3, &mut r);
            assert!(r1 < r0, "{smoother:?}: {r0} -> {r1}");
            assert_eq!(r, &b - &a.matvec(&x));
        }
    }

    #[test]
    fn test_zero_diagonal_row_is_left_alone() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 2.0_f64), (1, 0, 1.0)]);
        let s = LevelSmoother::init(&a, &AmgConfig::default()).unwrap();

        let mut x = Array1::from_vec(vec![0.0, 5.0]);
        let b = Array1::from_vec(vec![2.0, 1.0]);
        s.smooth(&a, &mut x, &b, 1, &mut Array1::zeros(2));
        assert_eq!(x[0], 1.0);
        assert_eq!(x[1], 5.0);

        // a round-off sized diagonal counts as zero too
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 2.0_f64), (1, 1, 1e-20)]);
        let s = LevelSmoother::init(&a, &AmgConfig::default()).unwrap();
        let mut x = Array1::from_vec(vec![0.0, 5.0]);
        s.smooth(&a, &mut x, &b, 1, &mut Array1::zeros(2));
        assert_eq!(x[1], 5.0);
    }

    #[test]
    fn test_zero_sweeps_reports_initial_residual() {
        let a = laplacian(4);
        let s = LevelSmoother::init(&a, &AmgConfig::default()).unwrap();
        let mut x = Array1::zeros(4);
        let b = Array1::from_elem(4, 3.0);

        let mut r = Array1::from_elem(4, 9.0);

        assert_eq!(s.smooth(&a, &mut x, &b, 0, &mut r), 6.0);
        assert_eq!(r, b);
    }
}
