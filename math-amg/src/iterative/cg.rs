//! CG (Conjugate Gradient) solver
//!
//! Plain and preconditioned Conjugate Gradient for symmetric positive
//! definite systems. With an AMG hierarchy as preconditioner this is the
//! usual way to drive the multigrid cycle on SPD problems.

use crate::traits::{ComplexField, IdentityPreconditioner, LinearOperator, Preconditioner};
use crate::vector::{axpy, inner_product, vector_norm};
use ndarray::Array1;
use num_traits::{One, ToPrimitive, Zero};

/// CG solver configuration
#[derive(Debug, Clone)]
pub struct CgConfig<R> {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: R,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for CgConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            print_interval: 0,
        }
    }
}

/// CG solver result
#[derive(Debug)]
pub struct CgSolution<T: ComplexField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: T::Real,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the Conjugate Gradient method
///
/// Note: This method is only correct for symmetric positive definite matrices.
pub fn cg<T, A>(operator: &A, b: &Array1<T>, config: &CgConfig<T::Real>) -> CgSolution<T>
where
    T: ComplexField,
    A: LinearOperator<T>,
{
    pcg(operator, &IdentityPreconditioner, b, config)
}

/// Solve Ax = b using preconditioned Conjugate Gradient
///
/// The preconditioner must be symmetric positive definite as well. A
/// V-cycle with symmetric smoothing (equal pre- and post-sweeps) is.
pub fn pcg<T, A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<T>,
    config: &CgConfig<T::Real>,
) -> CgSolution<T>
where
    T: ComplexField,
    A: LinearOperator<T>,
    P: Preconditioner<T>,
{
    let n = b.len();
    let mut x = Array1::from_elem(n, T::zero());

    let b_norm = vector_norm(b);
    let breakdown = T::real_from_f64(1e-30);
    if b_norm < T::real_from_f64(1e-15) {
        return CgSolution {
            x,
            iterations: 0,
            residual: T::Real::zero(),
            converged: true,
        };
    }

    // Initial residual r = b - Ax = b (since x = 0)
    let mut r = b.clone();
    let mut z = precond.apply(&r);
    let mut p = z.clone();
    let mut rho = inner_product(&r, &z);
    let mut rel_residual = T::Real::one();

    for iter in 0..config.max_iterations {
        // q = A * p
        let q = operator.apply(&p);

        // alpha = rho / (p, q)
        let pq = inner_product(&p, &q);
        if pq.norm() < breakdown {
            return CgSolution {
                x,
                iterations: iter,
                residual: rel_residual,
                converged: false,
            };
        }
        let alpha = rho / pq;

        axpy(alpha, &p, &mut x);
        axpy(-alpha, &q, &mut r);

        rel_residual = vector_norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "CG iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < config.tolerance {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        z = precond.apply(&r);
        let rho_new = inner_product(&r, &z);
        if rho_new.norm() < breakdown {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }

        let beta = rho_new / rho;
        rho = rho_new;

        // p = z + beta * p
        p.zip_mut_with(&z, |pi, &zi| *pi = zi + beta * *pi);
    }

    CgSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}
