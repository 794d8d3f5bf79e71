//! Iterative solvers for linear systems
//!
//! - [`cg`]: Conjugate Gradient - for symmetric positive definite systems
//! - [`pcg`]: preconditioned CG, typically with an AMG hierarchy

mod cg;

pub use cg::{CgConfig, CgSolution, cg, pcg};
