//! Sample covariance
//!
//! The unshrunk estimator every shrinkage method starts from. Observations
//! are normalized to an n x p layout (rows are observations) before any
//! reduction, so downstream code never has to care about `dims`.

use super::{CovarianceError, Dims};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Sample covariance together with the quantities it was built from
#[derive(Debug, Clone)]
pub struct SampleCovariance {
    /// p x p covariance matrix
    pub matrix: Array2<f64>,
    /// Per-variable sample mean
    pub mean: Array1<f64>,
    /// Number of observations (n)
    pub n_observations: usize,
    /// Number of variables (p)
    pub n_variables: usize,
}

/// View observations as an n x p matrix (rows are observations)
pub fn orient(observations: &Array2<f64>, dims: Dims) -> ArrayView2<'_, f64> {
    match dims {
        Dims::Rows => observations.view(),
        Dims::Columns => observations.t(),
    }
}

/// Compute the sample covariance matrix
///
/// # Arguments
/// * `observations` - Data matrix laid out according to `dims`
/// * `dims` - Whether observations run along rows or columns
/// * `corrected` - Divide by n - 1 (Bessel's correction) instead of n
pub fn sample_covariance(
    observations: &Array2<f64>,
    dims: Dims,
    corrected: bool,
) -> Result<SampleCovariance, CovarianceError> {
    let x = orient(observations, dims);
    let (n_observations, n_variables) = x.dim();

    let required = if corrected { 2 } else { 1 };
    if n_observations < required {
        return Err(CovarianceError::InsufficientSamples {
            required,
            actual: n_observations,
        });
    }
    if n_variables == 0 {
        return Err(CovarianceError::InvalidArgument(
            "observations have no variables".to_string(),
        ));
    }
    ensure_finite(x)?;

    let (centered, mean) = center(x);
    let divisor = if corrected {
        (n_observations - 1) as f64
    } else {
        n_observations as f64
    };
    let matrix = centered.t().dot(&centered) / divisor;

    Ok(SampleCovariance {
        matrix,
        mean,
        n_observations,
        n_variables,
    })
}

/// Subtract the column means from an n x p matrix
pub(crate) fn center(x: ArrayView2<'_, f64>) -> (Array2<f64>, Array1<f64>) {
    let mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let centered = &x - &mean.view().insert_axis(Axis(0));
    (centered, mean)
}

pub(crate) fn ensure_finite(x: ArrayView2<'_, f64>) -> Result<(), CovarianceError> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CovarianceError::InvalidArgument(
            "observations contain non-finite values".to_string(),
        ))
    }
}
