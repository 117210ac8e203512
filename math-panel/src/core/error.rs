//! Analysis error taxonomy

use solvers::SolverError;
use thiserror::Error;

/// Errors that abort a panel analysis
///
/// None of these terminate the process; the caller decides whether to retry,
/// exclude the offending panel or report the failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// NaN or infinity met while evaluating the influence of panel `col` on row `row`
    #[error("numerical error when calculating the influence of panel {col} on panel {row}")]
    Numerical {
        /// Row (collocation panel) index
        row: usize,
        /// Column (influencing panel) index
        col: usize,
    },
    /// The cancellation token was tripped; partial results were discarded
    #[error("analysis cancelled")]
    Cancelled,
    /// The dense solve did not produce a solution (singular or unconverged)
    #[error("linear solve failed: {0}")]
    SolverFailure(String),
    /// Mesh topology or wake links are inconsistent
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    /// A caller-supplied array has the wrong length
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<SolverError> for AnalysisError {
    fn from(e: SolverError) -> Self {
        AnalysisError::SolverFailure(e.to_string())
    }
}
