//! CLI error type.

use covshrink::CovarianceError;
use thiserror::Error;

/// Errors surfaced by the command-line front end
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// Input file could not be opened or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV (including rows of unequal length)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A field that is not a number
    #[error("line {line}, column {column}: cannot parse {value:?} as a number")]
    Parse {
        /// 1-based line in the input
        line: u64,
        /// 1-based column in the input
        column: usize,
        /// Offending field
        value: String,
    },

    /// No data rows
    #[error("input contains no observations")]
    EmptyInput,

    /// Rows could not be assembled into a matrix
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Estimation failed
    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    /// Report could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
