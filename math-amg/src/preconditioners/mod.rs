//! Preconditioners for iterative solvers
//!
//! Preconditioners approximate A^(-1) to accelerate convergence of iterative methods.
//!
//! - **AmgHierarchy**: algebraic multigrid, one V-cycle per application
//! - **IdentityPreconditioner**: no preconditioning

pub mod amg;

pub use amg::{
    AmgConfig, AmgDiagnostics, AmgHierarchy, AmgLevel, AmgSmoother, AmgSolution, AmgSolveConfig,
    CoarseSplitting, LevelSmoother, NodeState, StrengthNorm, StrongGraph,
};

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;
