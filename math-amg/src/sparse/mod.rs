//! Sparse matrix structures (CSR format)
//!
//! This module provides Compressed Sparse Row (CSR) storage with the row-wise
//! queries and in-place products used by the multigrid setup and cycle.

mod csr;

pub use csr::{CsrBuilder, CsrMatrix};
