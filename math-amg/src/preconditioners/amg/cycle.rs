//! V-cycle and the drivers built on it

use super::hierarchy::AmgHierarchy;
use crate::error::{AmgError, Result};
use crate::traits::{CoarseSolver, ComplexField, Preconditioner, Smoother};
use crate::vector::{fill_zero, vector_norm};
use ndarray::Array1;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;

/// Stopping rule for the stationary AMG iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmgSolveConfig {
    /// Maximum number of V-cycles
    pub max_cycles: usize,
    /// Relative residual ‖b - Ax‖ / ‖b‖ to reach (absolute if b = 0)
    pub tolerance: f64,
    /// Log progress every N cycles (0 = no output)
    pub print_interval: usize,
}

impl Default for AmgSolveConfig {
    fn default() -> Self {
        Self {
            max_cycles: 100,
            tolerance: 1e-8,
            print_interval: 0,
        }
    }
}

/// Result of [`AmgHierarchy::solve`]
#[derive(Debug)]
pub struct AmgSolution<T: ComplexField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of V-cycles performed
    pub cycles: usize,
    /// Final relative residual
    pub residual: T::Real,
    /// Whether the tolerance was reached
    pub converged: bool,
}

impl<T, S, C> AmgHierarchy<'_, T, S, C>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
{
    /// One V-cycle on `A x = b` in place, returns ‖b - A x‖₂
    pub fn iterate(&self, x: &mut Array1<T>, b: &Array1<T>) -> Result<T::Real> {
        self.check_sizes(x, b)?;
        self.cycle(0, x, b)
    }

    /// Repeat V-cycles until the relative residual drops below
    /// `config.tolerance` or `config.max_cycles` is reached
    pub fn solve(
        &self,
        b: &Array1<T>,
        x0: Option<&Array1<T>>,
        config: &AmgSolveConfig,
    ) -> Result<AmgSolution<T>> {
        let n = self.levels[0].size();
        let mut x = match x0 {
            Some(guess) => guess.clone(),
            None => Array1::from_elem(n, T::zero()),
        };
        self.check_sizes(&x, b)?;

        let b_norm = vector_norm(b);
        let reference = if b_norm > T::Real::zero() {
            b_norm
        } else {
            T::Real::one()
        };
        let tolerance = T::real_from_f64(config.tolerance);

        let mut r = Array1::from_elem(n, T::zero());
        self.levels[0].matrix.residual_into(&x, b, &mut r);
        let mut residual = vector_norm(&r) / reference;

        for cycle in 1..=config.max_cycles {
            if residual < tolerance {
                return Ok(AmgSolution {
                    x,
                    cycles: cycle - 1,
                    residual,
                    converged: true,
                });
            }

            residual = self.iterate(&mut x, b)? / reference;

            if config.print_interval > 0 && cycle % config.print_interval == 0 {
                log::info!(
                    "AMG cycle {}: relative residual = {:.6e}",
                    cycle,
                    residual.to_f64().unwrap_or(0.0)
                );
            }
        }

        Ok(AmgSolution {
            x,
            cycles: config.max_cycles,
            converged: residual < tolerance,
            residual,
        })
    }

    fn check_sizes(&self, x: &Array1<T>, b: &Array1<T>) -> Result<()> {
        let n = self.levels[0].size();
        for got in [x.len(), b.len()] {
            if got != n {
                return Err(AmgError::DimensionMismatch {
                    level: 0,
                    expected: n,
                    got,
                });
            }
        }
        Ok(())
    }

    fn cycle(&self, level: usize, x: &mut Array1<T>, b: &Array1<T>) -> Result<T::Real> {
        let lvl = &self.levels[level];
        let matrix = lvl.matrix();
        debug_assert_eq!(x.len(), matrix.num_rows);
        debug_assert_eq!(b.len(), matrix.num_rows);

        let Some(transfer) = lvl.transfer.as_ref() else {
            self.coarse_solver.solve(b, x)?;
            let mut r = self
                .coarse_residual
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            matrix.residual_into(x, b, &mut r);
            return Ok(vector_norm(&r));
        };

        let mut guard = transfer.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        let scratch = &mut *guard;

        // Pre-smoothing, leaves r = b - A*x in the scratch residual
        transfer.smoother.smooth(
            matrix,
            x,
            b,
            self.config.num_pre_smooth,
            &mut scratch.residual,
        );

        // Restrict the residual to the coarse grid
        transfer
            .restriction
            .matvec_into(&scratch.residual, &mut scratch.coarse_rhs);

        fill_zero(&mut scratch.coarse_correction);
        self.cycle(level + 1, &mut scratch.coarse_correction, &scratch.coarse_rhs)?;

        // x += P * e_c
        transfer
            .prolongation
            .matvec_add(&scratch.coarse_correction, x);

        // Post-smoothing
        Ok(transfer.smoother.smooth(
            matrix,
            x,
            b,
            self.config.num_post_smooth,
            &mut scratch.residual,
        ))
    }
}

impl<T, S, C> Preconditioner<T> for AmgHierarchy<'_, T, S, C>
where
    T: ComplexField,
    S: Smoother<T>,
    C: CoarseSolver<T>,
{
    /// One V-cycle from a zero initial guess
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        let mut z = Array1::from_elem(r.len(), T::zero());
        match self.iterate(&mut z, r) {
            Ok(_) => z,
            Err(err) => {
                log::error!("AMG preconditioner failed, passing residual through: {err}");
                r.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preconditioners::amg::config::{AmgConfig, AmgSmoother};
    use crate::sparse::CsrMatrix;
    use num_complex::Complex64;

    fn create_1d_laplacian(n: usize) -> CsrMatrix<Complex64> {
        let mut triplets: Vec<(usize, usize, Complex64)> = Vec::new();

        for i in 0..n {
            triplets.push((i, i, Complex64::new(2.0, 0.0)));
            if i > 0 {
                triplets.push((i, i - 1, Complex64::new(-1.0, 0.0)));
            }
            if i < n - 1 {
                triplets.push((i, i + 1, Complex64::new(-1.0, 0.0)));
            }
        }

        CsrMatrix::from_triplets(n, n, triplets)
    }

    fn config() -> AmgConfig {
        AmgConfig {
            min_coarse_size: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_amg_apply() {
        let matrix = create_1d_laplacian(128);
        let amg = AmgHierarchy::new(&matrix, config()).unwrap();

        let r = Array1::from_vec((0..128).map(|i| Complex64::new(i as f64, 0.0)).collect());
        let z = amg.apply(&r);

        assert_eq!(z.len(), r.len());
        let diff: f64 = (&z - &r).iter().map(|x| x.norm()).sum();
        assert!(diff > 1e-10, "Preconditioner should modify the vector");
    }

    #[test]
    fn test_amg_different_smoothers() {
        let matrix = create_1d_laplacian(128);
        let b = Array1::from_vec((0..128).map(|i| Complex64::new((i as f64).sin(), 0.0)).collect());

        for smoother in [
            AmgSmoother::Jacobi,
            AmgSmoother::L1Jacobi,
            AmgSmoother::SymmetricGaussSeidel,
        ] {
            let amg = AmgHierarchy::new(&matrix, AmgConfig { smoother, ..config() }).unwrap();
            let solution = amg
                .solve(&b, None, &AmgSolveConfig {
                    max_cycles: 200,
                    tolerance: 1e-6,
                    print_interval: 0,
                })
                .unwrap();
            assert!(solution.converged, "{smoother:?}: residual {}", solution.residual);
        }
    }

    #[test]
    fn test_iterate_reduces_residual() {
        let n = 128;
        let matrix = create_1d_laplacian(n);
        let amg = AmgHierarchy::new(&matrix, config()).unwrap();

        let b = Array1::from_vec(
            (0..n)
                .map(|i| Complex64::new((i as f64).sin(), 0.0))
                .collect(),
        );
        let mut x = Array1::from_elem(n, Complex64::new(0.0, 0.0));
        let norm_r0 = vector_norm(&b);

        let mut last = norm_r0;
        for _ in 0..10 {
            last = amg.iterate(&mut x, &b).unwrap();
        }

        let rf = &b - &matrix.matvec(&x);
        assert!((vector_norm(&rf) - last).abs() < 1e-10);
        assert!(
            last < norm_r0 * 0.1,
            "AMG should significantly reduce residual: {} -> {}",
            norm_r0,
            last
        );
    }

    #[test]
    fn test_reused_buffers_do_not_leak_between_cycles() {
        let n = 128;
        let matrix = create_1d_laplacian(n);
        let amg = AmgHierarchy::new(&matrix, config()).unwrap();
        assert!(amg.num_levels() >= 2);

        let b = Array1::from_vec((0..n).map(|i| Complex64::new((i as f64).cos(), 0.0)).collect());
        let other = Array1::from_elem(n, Complex64::new(-3.0, 1.0));

        let mut first = Array1::from_elem(n, Complex64::new(0.0, 0.0));
        let r_first = amg.iterate(&mut first, &b).unwrap();

        // dirty every level's workspace with an unrelated system
        let mut scratch_x = Array1::from_elem(n, Complex64::new(0.5, 0.0));
        amg.iterate(&mut scratch_x, &other).unwrap();

        let mut second = Array1::from_elem(n, Complex64::new(0.0, 0.0));
        let r_second = amg.iterate(&mut second, &b).unwrap();

        assert_eq!(first, second);
        assert_eq!(r_first, r_second);
    }

    #[test]
    fn test_zero_rhs_uses_absolute_tolerance() {
        let n = 128;
        let matrix = create_1d_laplacian(n);
        let amg = AmgHierarchy::new(&matrix, config()).unwrap();
        let b = Array1::from_elem(n, Complex64::new(0.0, 0.0));
        let x0 = Array1::from_vec((0..n).map(|i| Complex64::new((i as f64 * 0.3).sin(), 0.0)).collect());
        let initial = vector_norm(&matrix.matvec(&x0));

        let solution = amg
            .solve(&b, Some(&x0), &AmgSolveConfig {
                max_cycles: 200,
                tolerance: 1e-8,
                print_interval: 0,
            })
            .unwrap();
        assert!(solution.converged);
        assert!(solution.cycles > 0);
        assert_eq!(solution.residual, vector_norm(&matrix.matvec(&solution.x)));
        assert!(initial > 1e-2);
        assert!(solution.residual < 1e-8);
    }

    #[test]
    fn test_single_level_is_exact() {
        let matrix = create_1d_laplacian(40);
        let amg = AmgHierarchy::new(&matrix, AmgConfig::default()).unwrap();
        assert_eq!(amg.num_levels(), 1);

        let b = Array1::from_elem(40, Complex64::new(1.0, 0.0));
        let solution = amg.solve(&b, None, &AmgSolveConfig::default()).unwrap();
        assert!(solution.converged);
        assert_eq!(solution.cycles, 1);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let matrix = create_1d_laplacian(64);
        let amg = AmgHierarchy::new(&matrix, config()).unwrap();

        let mut x = Array1::from_elem(63, Complex64::new(0.0, 0.0));
        let b = Array1::from_elem(64, Complex64::new(1.0, 0.0));
        let err = amg.iterate(&mut x, &b).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(matches!(
            err,
            AmgError::DimensionMismatch {
                level: 0,
                expected: 64,
                got: 63
            }
        ));

        // the preconditioner falls back to the identity
        let r = Array1::from_elem(10, Complex64::new(2.0, 0.0));
        assert_eq!(amg.apply(&r), r);
        assert!(amg.solve(&b, Some(&x), &AmgSolveConfig::default()).is_err());
    }
}
