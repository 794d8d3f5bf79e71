//! Error types for the AMG kernel.
//!
//! Contract violations (wrong sizes, corrupted coarsening state) and numerical
//! breakdowns (degenerate interpolation rows, singular coarse operators) are
//! distinct variants so callers can tell a bug from a bad matrix. Slow
//! convergence is never an error: cycles report their residual as a value.

use thiserror::Error;

/// Errors that can occur while building or applying an AMG hierarchy.
#[derive(Debug, Error)]
pub enum AmgError {
    /// Vector or matrix sizes do not match at a level.
    #[error("dimension mismatch at level {level}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Level at which the mismatch was detected
        level: usize,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// The coarsener selected a node that already has a Coarse/Fine state.
    #[error("coarsening selected node {node}, which is already assigned")]
    NodeAlreadyAssigned {
        /// Offending node index
        node: usize,
    },

    /// A node is marked fine-indirect although aggressive coarsening is off.
    #[error("node {node} is fine-indirect but aggressive coarsening is disabled")]
    UnexpectedIndirectFine {
        /// Offending node index
        node: usize,
    },

    /// Interpolatory weight sum vanished while the neighbour sum did not.
    #[error("numerically unstable interpolation at level {level}, row {row}")]
    UnstableInterpolation {
        /// Level of the fine matrix
        level: usize,
        /// Fine row index
        row: usize,
    },

    /// The direct solver found the coarsest operator singular.
    #[error("coarsest-level matrix is singular or nearly singular")]
    SingularCoarseMatrix,

    /// Configuration values are out of range.
    #[error("invalid AMG configuration: {0}")]
    InvalidConfig(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for AMG operations.
pub type Result<T> = std::result::Result<T, AmgError>;

impl AmgError {
    /// Returns `true` for caller or implementation bugs that must not be retried.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            AmgError::DimensionMismatch { .. }
                | AmgError::NodeAlreadyAssigned { .. }
                | AmgError::UnexpectedIndirectFine { .. }
        )
    }

    /// Returns `true` if the matrix itself is numerically degenerate.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            AmgError::UnstableInterpolation { .. } | AmgError::SingularCoarseMatrix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AmgError::DimensionMismatch {
            level: 2,
            expected: 10,
            got: 7,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch at level 2: expected 10, got 7"
        );
    }

    #[test]
    fn test_error_categories() {
        let contract = AmgError::NodeAlreadyAssigned { node: 3 };
        let numerical = AmgError::UnstableInterpolation { level: 0, row: 5 };
        let config = AmgError::InvalidConfig("max_levels must be >= 1".into());

        assert!(contract.is_contract_violation());
        assert!(!contract.is_numerical());
        assert!(numerical.is_numerical());
        assert!(!numerical.is_contract_violation());
        assert!(!config.is_contract_violation() && !config.is_numerical());
    }
}
