//! Oracle Approximating Shrinkage Estimator
//!
//! Implements the estimator from:
//! "Shrinkage Algorithms for MMSE Covariance Estimation"
//! (Chen, Wiesel, Eldar & Hero, 2010)
//!
//! Iterating the oracle shrinkage toward the scaled identity target
//! F = (tr(S)/p) I to its fixed point gives:
//!
//! ρ = ((1 - 2/p) · tr(S²) + tr(S)²) / ((n + 1 - 2/p) · (tr(S²) - tr(S)²/p))
//!
//! clamped to [0, 1].

use super::rao_blackwell::{check_observations, trace_moments};
use super::sample::sample_covariance;
use super::shrinkage::{Shrinkage, resolve_intensity, scaled_identity, shrink_toward};
use super::{CovarianceError, CovarianceEstimator, Dims, SampleCovariance};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Oracle approximating shrinkage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OasConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Shrinkage intensity (default: Auto)
    pub shrinkage: Shrinkage,
}

impl Default for OasConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            shrinkage: Shrinkage::Auto,
        }
    }
}

/// Oracle approximating shrinkage covariance estimator
#[derive(Debug, Default, Clone)]
pub struct OracleApproximatingShrinkage {
    config: OasConfig,
}

impl OracleApproximatingShrinkage {
    /// Create a new estimator with the given configuration
    pub fn new(config: OasConfig) -> Result<Self, CovarianceError> {
        config.shrinkage.validate()?;
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &OasConfig {
        &self.config
    }

    /// Shrinkage intensity applied for these observations
    pub fn shrinkage_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<f64, CovarianceError> {
        check_observations(observations, dims, self.config.min_observations)?;
        let sample = sample_covariance(observations, dims, false)?;
        Ok(self.intensity(&sample))
    }

    /// Shrunk covariance together with the intensity that produced it
    pub fn estimate_with_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<(Array2<f64>, f64), CovarianceError> {
        check_observations(observations, dims, self.config.min_observations)?;
        let sample = sample_covariance(observations, dims, false)?;
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

                let numerator = (1.0 - 2.0 / p) * trace_sq + trace * trace;
                let factor = n + 1.0 - 2.0 / p;
                let denominator = factor * (trace_sq - trace * trace / p);
                let rho = resolve_intensity(numerator, denominator, factor * trace_sq);
                debug!(trace, trace_sq, rho, "oracle approximating shrinkage intensity");
                rho
            }
        }
    }
}

impl CovarianceEstimator for OracleApproximatingShrinkage {
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_intensity(observations, dims)
            .map(|(covariance, _)| covariance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::RaoBlackwellLedoitWolf;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    #[test]
    fn test_config_default() {
        let config = OasConfig::default();
        assert_eq!(config.min_observations, 2);
        assert_eq!(config.shrinkage, Shrinkage::Auto);
    }

    #[test]
    fn test_intensity_by_hand() {
        let returns = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let estimator = OracleApproximatingShrinkage::default();

        // p = 2 zeroes the tr(S²) term of the numerator
        let trace = 10.0 / 3.0;
        let trace_sq = 100.0 / 9.0;
        let expected = (trace * trace) / ((3.0 + 1.0 - 1.0) * (trace_sq - trace * trace / 2.0));

        let rho = estimator.shrinkage_intensity(&returns, Dims::Rows).unwrap();
        assert_relative_eq!(rho, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_single_variable_is_degenerate() {
        let returns = array![[1.0], [2.0], [4.0]];
        let estimator = OracleApproximatingShrinkage::default();

        let rho = estimator.shrinkage_intensity(&returns, Dims::Rows).unwrap();
        assert_eq!(rho, 0.0);

        let cov = estimator.estimate(&returns, Dims::Rows).unwrap();
        let sample = sample_covariance(&returns, Dims::Rows, false).unwrap();
        assert_relative_eq!(cov[[0, 0]], sample.matrix[[0, 0]], epsilon = 1e-12);
    }

    #[test]
    fn test_clamped_for_tiny_samples() {
        let mut rng = StdRng::seed_from_u64(9);
        let returns: Array2<f64> =
            Array2::from_shape_simple_fn((3, 40), || StandardNormal.sample(&mut rng));

        let rho = OracleApproximatingShrinkage::default()
            .shrinkage_intensity(&returns, Dims::Rows)
            .unwrap();
        assert!((0.0..=1.0).contains(&rho));
    }

    #[test]
    fn test_oas_close_to_rblw_for_large_samples() {
        let mut rng = StdRng::seed_from_u64(31);
        let returns: Array2<f64> = Array2::from_shape_fn((400, 8), |(_, j)| {
            let z: f64 = StandardNormal.sample(&mut rng);
            z * (1.0 + j as f64)
        });

        let oas = OracleApproximatingShrinkage::default()
            .shrinkage_intensity(&returns, Dims::Rows)
            .unwrap();
        let rblw = RaoBlackwellLedoitWolf::default()
            .shrinkage_intensity(&returns, Dims::Rows)
            .unwrap();

        assert!(oas > 0.0 && oas < 0.1, "oas = {oas}");
        assert!((oas - rblw).abs() < 0.02, "oas = {oas}, rblw = {rblw}");
    }
}
