//! Covariance matrix estimation
//!
//! Provides the plain sample covariance together with a family of shrinkage
//! estimators that pull it toward structured targets. The linear estimators
//! (Ledoit-Wolf, Rao-Blackwell Ledoit-Wolf, Oracle Approximating Shrinkage)
//! apply a scalar intensity to a fixed target; the analytical nonlinear
//! estimator re-estimates every sample eigenvalue individually.

pub mod estimator;
pub mod kernel;
pub mod ledoit_wolf;
pub mod nonlinear;
pub mod oas;
pub mod rao_blackwell;
pub mod sample;
pub mod shrinkage;
pub mod utils;

pub use estimator::{ShrinkageEstimate, ShrinkageEstimator, ShrinkageMethod};
pub use kernel::{SpectralDensity, epanechnikov, epanechnikov_hilbert, spectral_density};
pub use ledoit_wolf::{LedoitWolfConfig, LedoitWolfEstimator, ShrinkageTarget};
pub use nonlinear::{AnalyticalNonlinearShrinkage, NonlinearShrinkageConfig};
pub use oas::{OasConfig, OracleApproximatingShrinkage};
pub use rao_blackwell::{RaoBlackwellConfig, RaoBlackwellLedoitWolf};
pub use sample::{SampleCovariance, orient, sample_covariance};
pub use shrinkage::Shrinkage;
pub use utils::{
    EigenDecomposition, condition_number, is_positive_definite, is_positive_semi_definite,
    reconstruct_from_eigen, symmetric_eigen,
};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// An argument is outside its allowed domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Too few observations for the requested estimator
    #[error("Insufficient samples: need at least {required} observations, got {actual}")]
    InsufficientSamples {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Fixed shrinkage intensity outside [0, 1]
    #[error("Invalid shrinkage intensity: {0} (must be between 0 and 1)")]
    InvalidShrinkage(f64),

    /// Sample covariance has no positive eigenvalue
    #[error("Degenerate spectrum: sample covariance has no positive eigenvalue")]
    DegenerateSpectrum,
}

/// Orientation of an observation matrix
///
/// `Rows` (`dims = 1`) means each row is an observation and each column a
/// variable; `Columns` (`dims = 2`) is the transpose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Dims {
    /// Observations along rows, variables along columns
    #[default]
    Rows,
    /// Observations along columns, variables along rows
    Columns,
}

impl TryFrom<usize> for Dims {
    type Error = CovarianceError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Rows),
            2 => Ok(Self::Columns),
            other => Err(CovarianceError::InvalidArgument(format!(
                "dims should be 1 or 2, got {other}"
            ))),
        }
    }
}

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from observations
    ///
    /// # Arguments
    /// * `observations` - Data matrix laid out according to `dims`
    /// * `dims` - Whether observations run along rows or columns
    ///
    /// # Returns
    /// * Estimated covariance matrix (p x p where p is the number of variables)
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims_from_index() {
        assert_eq!(Dims::try_from(1_usize).unwrap(), Dims::Rows);
        assert_eq!(Dims::try_from(2_usize).unwrap(), Dims::Columns);
        assert_eq!(Dims::default(), Dims::Rows);
    }

    #[test]
    fn test_dims_rejects_other_values() {
        for value in [0_usize, 3, 42] {
            match Dims::try_from(value) {
                Err(CovarianceError::InvalidArgument(msg)) => {
                    assert!(msg.contains(&value.to_string()), "message: {msg}");
                }
                other => panic!("expected InvalidArgument, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_error_messages() {
        let err = CovarianceError::InsufficientSamples {
            required: 12,
            actual: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient samples: need at least 12 observations, got 5"
        );
        assert!(
            CovarianceError::InvalidShrinkage(1.5)
                .to_string()
                .contains("1.5")
        );
    }
}
