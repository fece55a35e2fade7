//! Utilities for covariance matrix manipulation
//!
//! This module provides the symmetric eigendecomposition used by the
//! nonlinear estimator, reconstruction of a matrix from its eigenpairs, and
//! positive-definiteness diagnostics for estimated covariance matrices.

use super::CovarianceError;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in ascending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors, paired with `eigenvalues`)
    pub eigenvectors: Array2<f64>,
}

impl EigenDecomposition {
    /// Number of eigenpairs
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Whether the decomposition is empty
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Reorder the eigenpairs so that eigenvalues are ascending
    ///
    /// Eigenvector columns are permuted identically. Decompositions supplied
    /// by callers may come in any order, so every consumer goes through this.
    pub fn sorted_ascending(&self) -> Result<Self, CovarianceError> {
        let n = self.eigenvalues.len();
        if self.eigenvectors.nrows() != n || self.eigenvectors.ncols() != n {
            return Err(CovarianceError::DimensionMismatch {
                expected: n,
                actual: self.eigenvectors.ncols(),
            });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&i, &j| self.eigenvalues[i].total_cmp(&self.eigenvalues[j]));

        let eigenvalues = indices.iter().map(|&i| self.eigenvalues[i]).collect();
        let eigenvectors = self.eigenvectors.select(Axis(1), &indices);

        Ok(Self {
            eigenvalues,
            eigenvectors,
        })
    }

    /// Ratio of the largest to the smallest eigenvalue
    ///
    /// Infinite when the smallest eigenvalue is zero up to rounding relative
    /// to the largest one.
    pub fn condition_number(&self) -> f64 {
        let (Some(&min_eig), Some(&max_eig)) = (
            self.eigenvalues.iter().min_by(|a, b| a.total_cmp(b)),
            self.eigenvalues.iter().max_by(|a, b| a.total_cmp(b)),
        ) else {
            return f64::INFINITY;
        };

        if min_eig <= max_eig.abs() * f64::EPSILON * self.len() as f64 {
            f64::INFINITY
        } else {
            max_eig / min_eig
        }
    }
}

/// Eigendecomposition of a real symmetric matrix
///
/// Bridges to `nalgebra`'s symmetric eigensolver and returns the eigenpairs
/// sorted by ascending eigenvalue.
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
///
/// # Returns
/// * Eigenvalues and eigenvectors
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<EigenDecomposition, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(CovarianceError::InvalidArgument(
            "matrix contains non-finite values".to_string(),
        ));
    }

    // Only the lower triangle is read, mirrored so tiny asymmetries are ignored
    let dense = DMatrix::<f64>::from_fn(n, n, |i, j| {
        if i >= j {
            matrix[[i, j]]
        } else {
            matrix[[j, i]]
        }
    });
    let eigen = dense.symmetric_eigen();

    let eigenvalues = Array1::from_iter(eigen.eigenvalues.iter().copied());
    let eigenvectors = Array2::from_shape_fn((n, n), |(i, j)| eigen.eigenvectors[(i, j)]);

    EigenDecomposition {
        eigenvalues,
        eigenvectors,
    }
    .sorted_ascending()
}

/// Reconstruct a matrix from eigenvalues and eigenvectors
///
/// Computes: M = V * Λ * V^T, averaged with its transpose so the result is
/// exactly symmetric.
///
/// # Arguments
/// * `eigenvalues` - Diagonal elements of Λ
/// * `eigenvectors` - Matrix V (columns are eigenvectors)
///
/// # Returns
/// * Reconstructed matrix
pub fn reconstruct_from_eigen(
    eigenvalues: &Array1<f64>,
    eigenvectors: &Array2<f64>,
) -> Result<Array2<f64>, CovarianceError> {
    let n = eigenvalues.len();
    if eigenvectors.nrows() != n || eigenvectors.ncols() != n {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: eigenvectors.nrows(),
        });
    }

    // V * Λ scales each column of V by its eigenvalue
    let v_lambda = eigenvectors * &eigenvalues.view().insert_axis(Axis(0));
    let result = v_lambda.dot(&eigenvectors.t());

    Ok((&result + &result.t()) / 2.0)
}

/// Eigenvalues below this fraction of the largest one count as zero
const SPECTRAL_TOLERANCE: f64 = 1e-10;

/// Check if a matrix is positive definite
///
/// Every eigenvalue must exceed the largest one times a small relative
/// tolerance, so the answer does not depend on the units of the data.
pub fn is_positive_definite(cov: &Array2<f64>) -> bool {
    extreme_eigenvalues(cov).is_some_and(|(min, max)| max > 0.0 && min > SPECTRAL_TOLERANCE * max)
}

/// Check if a matrix is positive semi-definite, up to the same relative
/// tolerance as [`is_positive_definite`]
pub fn is_positive_semi_definite(cov: &Array2<f64>) -> bool {
    extreme_eigenvalues(cov).is_some_and(|(min, max)| min >= -SPECTRAL_TOLERANCE * max.abs())
}

/// Smallest and largest eigenvalue of a square, non-empty matrix
fn extreme_eigenvalues(cov: &Array2<f64>) -> Option<(f64, f64)> {
    if cov.nrows() != cov.ncols() || cov.is_empty() {
        return None;
    }

    // Quick check: a negative variance rules out semi-definiteness
    if cov.diag().iter().any(|&v| v < 0.0) {
        return None;
    }

    let decomp = symmetric_eigen(cov).ok()?;
    let n = decomp.len();
    Some((decomp.eigenvalues[0], decomp.eigenvalues[n - 1]))
}

/// Compute the condition number of a matrix
///
/// The condition number is the ratio of the largest to smallest eigenvalue.
/// A large condition number indicates numerical instability.
///
/// # Arguments
/// * `cov` - Matrix to analyze
///
/// # Returns
/// * Condition number (infinity if smallest eigenvalue is zero)
pub fn condition_number(cov: &Array2<f64>) -> f64 {
    symmetric_eigen(cov).map_or(f64::INFINITY, |decomp| decomp.condition_number())
}
