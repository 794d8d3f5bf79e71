//! Algebraic Multigrid (AMG)
//!
//! Classical (Ruge-Stüben style) AMG built entirely from the matrix:
//!
//! 1. **Strength**: `j` is a strong neighbour of `i` when
//!    `‖a_ij‖ ≥ θ · max_k ‖a_ik‖` ([`StrongGraph`])
//! 2. **Coarsening**: greedy selection by rating, optionally followed by an
//!    aggressive second pass on the first level ([`CoarseSplitting`])
//! 3. **Interpolation**: direct weights from coarse neighbours, indirect
//!    weights through fine neighbours for aggressive coarsening
//! 4. **Galerkin**: `A_c = R A P` with `R = Pᵀ`
//! 5. **Cycle**: V-cycle with pre/post smoothing and a dense LU solve on the
//!    coarsest level
//!
//! # Example
//!
//! ```ignore
//! use math_amg::{AmgConfig, AmgHierarchy, AmgSolveConfig};
//!
//! let amg = AmgHierarchy::new(&matrix, AmgConfig::default())?;
//! let solution = amg.solve(&b, None, &AmgSolveConfig::default())?;
//! ```

mod coarsening;
mod config;
mod cycle;
pub mod export;
mod galerkin;
mod heap;
mod hierarchy;
mod interpolation;
mod scratch;
mod smoother;
mod strength;

pub use coarsening::{CoarseSplitting, NodeState};
pub use config::{AmgConfig, AmgSmoother, StrengthNorm};
pub use cycle::{AmgSolution, AmgSolveConfig};
pub use export::{write_coarsening, write_hierarchy, write_matrix_market};
pub use hierarchy::{AmgDiagnostics, AmgHierarchy, AmgLevel};
pub use smoother::LevelSmoother;
pub use strength::StrongGraph;
