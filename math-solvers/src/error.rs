//! Error type shared by all dense backends

use thiserror::Error;

/// Errors reported by the dense solvers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// A zero (or vanishing) pivot was met during factorisation
    #[error("Matrix is singular or nearly singular (pivot {pivot})")]
    SingularMatrix {
        /// Elimination step at which the pivot vanished
        pivot: usize,
    },
    /// The least-squares system does not have full column rank
    #[error("Least-squares matrix is rank deficient (column {column})")]
    RankDeficient {
        /// First column found linearly dependent
        column: usize,
    },
    /// Operand shapes do not agree
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
    /// Failure reported by an external backend
    #[error("Backend failure: {0}")]
    Backend(String),
}
