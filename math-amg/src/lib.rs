//! Algebraic multigrid for sparse linear systems
//!
//! This crate builds a classical AMG hierarchy from a sparse matrix alone and
//! applies it as a stationary solver or as a preconditioner for CG.
//!
//! # Features
//!
//! - **Coarsening**: strength-of-connection graph, greedy rating-based
//!   coarse/fine splitting, optional aggressive (A1/A2) first-level coarsening
//! - **Interpolation**: direct and multipass indirect prolongation, `R = Pᵀ`
//! - **Galerkin**: sparse triple product `R A P` for every coarse level
//! - **Cycle**: V-cycle with Gauss-Seidel or (l1-)Jacobi smoothing and a
//!   dense LU solve on the coarsest level
//! - **Drivers**: [`AmgHierarchy::solve`] and [`pcg`]
//! - **Generic Scalar Types**: Works with Complex64, Complex32, f64, f32
//!
//! # Example
//!
//! ```ignore
//! use math_amg::{AmgConfig, AmgHierarchy, CgConfig, gallery, pcg};
//! use ndarray::Array1;
//!
//! let matrix = gallery::poisson_2d::<f64>(64);
//! let amg = AmgHierarchy::new(&matrix, AmgConfig::default())?;
//!
//! let b = Array1::from_elem(matrix.num_rows, 1.0);
//! let solution = pcg(&matrix, &amg, &b, &CgConfig::default());
//! ```

pub mod direct;
pub mod error;
pub mod gallery;
pub mod iterative;
pub mod preconditioners;
pub mod sparse;
pub mod traits;
pub mod vector;

// Re-export main types
pub use error::{AmgError, Result};
pub use sparse::{CsrBuilder, CsrMatrix};
pub use traits::{CoarseSolver, ComplexField, LinearOperator, Preconditioner, Smoother};

// Re-export iterative solvers
pub use iterative::{CgConfig, CgSolution, cg, pcg};

// Re-export direct solvers
pub use direct::{LuFactorization, lu_factorize, lu_solve};

// Re-export the multigrid
pub use preconditioners::amg::export;
pub use preconditioners::{
    AmgConfig, AmgDiagnostics, AmgHierarchy, AmgLevel, AmgSmoother, AmgSolution, AmgSolveConfig,
    CoarseSplitting, IdentityPreconditioner, LevelSmoother, NodeState, StrengthNorm, StrongGraph,
};
