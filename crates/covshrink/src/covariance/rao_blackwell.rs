//! Rao-Blackwell Ledoit-Wolf Shrinkage Estimator
//!
//! Implements the estimator from:
//! "Shrinkage Algorithms for MMSE Covariance Estimation"
//! (Chen, Wiesel, Eldar & Hero, 2010)
//!
//! Conditioning the Ledoit-Wolf intensity on the sufficient statistic S
//! gives, for Gaussian data and the scaled identity target F = (tr(S)/p) I:
//!
//! ρ = ((n-2)/n · tr(S²) + tr(S)²) / ((n+2) · (tr(S²) - tr(S)²/p))
//!
//! clamped to [0, 1].

use super::sample::sample_covariance;
use super::shrinkage::{Shrinkage, resolve_intensity, scaled_identity, shrink_toward};
use super::{CovarianceError, CovarianceEstimator, Dims, SampleCovariance};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rao-Blackwell Ledoit-Wolf estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaoBlackwellConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Shrinkage intensity (default: Auto)
    pub shrinkage: Shrinkage,
}

impl Default for RaoBlackwellConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            shrinkage: Shrinkage::Auto,
        }
    }
}

/// Rao-Blackwell Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Default, Clone)]
pub struct RaoBlackwellLedoitWolf {
    config: RaoBlackwellConfig,
}

impl RaoBlackwellLedoitWolf {
    /// Create a new estimator with the given configuration
    pub fn new(config: RaoBlackwellConfig) -> Result<Self, CovarianceError> {
        config.shrinkage.validate()?;
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &RaoBlackwellConfig {
        &self.config
    }

    /// Shrinkage intensity applied for these observations
    pub fn shrinkage_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<f64, CovarianceError> {
        let sample = self.sample(observations, dims)?;
        Ok(self.intensity(&sample))
    }

    fn sample(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<SampleCovariance, CovarianceError> {
        check_observations(observations, dims, self.config.min_observations)?;
        sample_covariance(observations, dims, false)
    }

    /// Shrunk covariance together with the intensity that produced it
    pub fn estimate_with_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<(Array2<f64>, f64), CovarianceError> {
        let sample = self.sample(observations, dims)?;
        let target = scaled_identity(&sample.matrix);
        let rho = self.intensity(&sample);
        Ok((shrink_toward(&sample.matrix, &target, rho), rho))
    }

    fn intensity(&self, sample: &SampleCovariance) -> f64 {
        match self.config.shrinkage {
            Shrinkage::Fixed(rho) => rho,
            Shrinkage::Auto => {
                let n = sample.n_observations as f64;
                let p = sample.n_variables as f64;
                let (trace, trace_sq) = trace_moments(&sample.matrix);

                let numerator = (n - 2.0) / n * trace_sq + trace * trace;
                let denominator = (n + 2.0) * (trace_sq - trace * trace / p);
                let rho = resolve_intensity(numerator, denominator, (n + 2.0) * trace_sq);
                debug!(trace, trace_sq, rho, "rao-blackwell shrinkage intensity");
                rho
            }
        }
    }
}

impl CovarianceEstimator for RaoBlackwellLedoitWolf {
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_intensity(observations, dims)
            .map(|(covariance, _)| covariance)
    }
}

/// (tr(S), tr(S²)) of a symmetric matrix; tr(S²) is the squared Frobenius norm
pub(crate) fn trace_moments(sample: &Array2<f64>) -> (f64, f64) {
    let trace = sample.diag().sum();
    let trace_sq = sample.iter().map(|v| v * v).sum();
    (trace, trace_sq)
}

pub(crate) fn check_observations(
    observations: &Array2<f64>,
    dims: Dims,
    min_observations: usize,
) -> Result<(), CovarianceError> {
    let n_observations = match dims {
        Dims::Rows => observations.nrows(),
        Dims::Columns => observations.ncols(),
    };
    if n_observations < min_observations {
        return Err(CovarianceError::InsufficientSamples {
            required: min_observations,
            actual: n_observations,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_config_default() {
        let config = RaoBlackwellConfig::default();
        assert_eq!(config.min_observations, 2);
        assert_eq!(config.shrinkage, Shrinkage::Auto);
    }

    #[test]
    fn test_trace_moments() {
        let s = array![[2.0, 1.0], [1.0, 3.0]];
        let (trace, trace_sq) = trace_moments(&s);
        assert_relative_eq!(trace, 5.0);
        // tr(S²) = 4 + 1 + 1 + 9
        assert_relative_eq!(trace_sq, 15.0);
    }

    #[test]
    fn test_intensity_by_hand() {
        // Centered columns [-1, 0, 1] and [-2, 0, 2]: S = [[2/3, 4/3], [4/3, 8/3]]
        let returns = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let estimator = RaoBlackwellLedoitWolf::default();

        let trace = 10.0 / 3.0;
        let trace_sq = (4.0 + 16.0 + 16.0 + 64.0) / 9.0;
        let n = 3.0;
        let expected: f64 = ((n - 2.0) / n * trace_sq + trace * trace)
            / ((n + 2.0) * (trace_sq - trace * trace / 2.0));

        let rho = estimator.shrinkage_intensity(&returns, Dims::Rows).unwrap();
        assert_relative_eq!(rho, expected.min(1.0), epsilon = 1e-12);
        assert!(rho > 0.0 && rho <= 1.0);
    }

    #[test]
    fn test_isotropic_sample_is_degenerate() {
        // S is already a multiple of the identity
        let returns = array![[1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, -1.0]];
        let estimator = RaoBlackwellLedoitWolf::default();

        let rho = estimator.shrinkage_intensity(&returns, Dims::Rows).unwrap();
        assert_eq!(rho, 1.0);

        let cov = estimator.estimate(&returns, Dims::Rows).unwrap();
        assert_relative_eq!(cov[[0, 0]], 0.5, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_samples() {
        let estimator = RaoBlackwellLedoitWolf::default();
        let returns = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            estimator.estimate(&returns, Dims::Rows),
            Err(CovarianceError::InsufficientSamples {
                required: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_fixed_half() {
        let estimator = RaoBlackwellLedoitWolf::new(RaoBlackwellConfig {
            shrinkage: Shrinkage::Fixed(0.5),
            ..Default::default()
        })
        .unwrap();
        let returns = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];

        let cov = estimator.estimate(&returns, Dims::Rows).unwrap();

        // μ = 5/3; halfway between S and μ I
        assert_relative_eq!(cov[[0, 0]], (2.0 / 3.0 + 5.0 / 3.0) / 2.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 2.0 / 3.0, epsilon = 1e-12);
    }
}
