//! Direct solvers for linear systems
//!
//! - [`lu_solve`] / [`lu_factorize`]: LU decomposition with partial pivoting
//! - [`LuFactorization`]: the default coarsest-level [`CoarseSolver`](crate::traits::CoarseSolver)

mod lu;

pub use lu::{LuFactorization, lu_factorize, lu_solve};
