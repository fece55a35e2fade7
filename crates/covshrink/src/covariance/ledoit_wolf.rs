//! Ledoit-Wolf Shrinkage Covariance Estimator
//!
//! Implements the linear shrinkage estimators from:
//! "A Well-Conditioned Estimator for Large-Dimensional Covariance Matrices"
//! (Ledoit & Wolf, 2004) and "Honey, I Shrunk the Sample Covariance Matrix"
//! (Ledoit & Wolf, 2004)
//!
//! The Ledoit-Wolf estimator shrinks the sample covariance matrix toward a
//! structured target to improve conditioning and reduce estimation error,
//! especially when the number of observations is small relative to the
//! number of variables.
//!
//! The estimator has the form:
//! Σ_LW = δ* F + (1-δ*) S
//!
//! where:
//! - S is the sample covariance matrix
//! - F is the shrinkage target (typically a structured matrix like identity)
//! - δ* is the optimal shrinkage intensity, clamp((π̂ - ρ̂) / (n γ̂), 0, 1)

use super::sample::{center, ensure_finite, orient};
use super::shrinkage::{
    Shrinkage, resolve_intensity, scaled_identity, shrink_toward, squared_distance,
};
use super::{CovarianceError, CovarianceEstimator, Dims};
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shrinkage target types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ShrinkageTarget {
    /// Identity matrix scaled by average variance: F = μ * I where μ = trace(S)/p
    #[default]
    Identity,

    /// Sample variances on the diagonal with one average correlation off it
    ConstantCorrelation,

    /// Diagonal matrix (no off-diagonal elements)
    Diagonal,
}

/// Ledoit-Wolf covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedoitWolfConfig {
    /// Minimum number of observations required (default: 2)
    pub min_observations: usize,

    /// Shrinkage target type (default: Identity)
    pub target: ShrinkageTarget,

    /// Shrinkage intensity (default: Auto)
    pub shrinkage: Shrinkage,

    /// Whether to center observations (subtract mean) before computing covariance
    pub center: bool,
}

impl Default for LedoitWolfConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            target: ShrinkageTarget::Identity,
            shrinkage: Shrinkage::Auto,
            center: true,
        }
    }
}

/// Ledoit-Wolf shrinkage covariance estimator
#[derive(Debug, Default, Clone)]
pub struct LedoitWolfEstimator {
    config: LedoitWolfConfig,
}

/// Quantities shared by the intensity and the final estimate
struct Moments {
    /// Data the covariance was built from (centered unless disabled)
    data: Array2<f64>,
    /// Sample covariance, divided by n
    sample_cov: Array2<f64>,
}

impl LedoitWolfEstimator {
    /// Create a new Ledoit-Wolf estimator with the given configuration
    pub fn new(config: LedoitWolfConfig) -> Result<Self, CovarianceError> {
        config.shrinkage.validate()?;
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &LedoitWolfConfig {
        &self.config
    }

    fn moments(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Moments, CovarianceError> {
        let x = orient(observations, dims);
        let n_periods = x.nrows();

        // Check minimum observations
        let required = self.config.min_observations.max(1);
        if n_periods < required {
            return Err(CovarianceError::InsufficientSamples {
                required,
                actual: n_periods,
            });
        }
        ensure_finite(x)?;

        let data = if self.config.center {
            center(x).0
        } else {
            x.to_owned()
        };

        // Sample covariance: S = (1/n) * X^T * X
        let sample_cov = data.t().dot(&data) / n_periods as f64;

        Ok(Moments { data, sample_cov })
    }

    /// Compute the shrinkage target matrix F
    fn shrinkage_target(&self, sample_cov: &Array2<f64>) -> Array2<f64> {
        let n_variables = sample_cov.nrows();

        match self.config.target {
            ShrinkageTarget::Identity => scaled_identity(sample_cov),

            ShrinkageTarget::Diagonal => Array2::from_diag(&sample_cov.diag()),

            ShrinkageTarget::ConstantCorrelation => {
                // F has same variances as S but constant correlation
                let variances: Array1<f64> = sample_cov.diag().to_owned();
                let std_devs = variances.mapv(f64::sqrt);
                let avg_corr = average_correlation(sample_cov, &std_devs);

                Array2::from_shape_fn((n_variables, n_variables), |(i, j)| {
                    if i == j {
                        variances[i]
                    } else {
                        avg_corr * std_devs[i] * std_devs[j]
                    }
                })
            }
        }
    }

    /// Compute optimal shrinkage intensity using the Ledoit-Wolf formula
    ///
    /// The shrinkage intensity δ* minimizes the expected squared Frobenius norm
    /// of the estimation error:
    /// - π̂ = Σ_ij π_ij, π_ij = (1/n) Σ_t (x_ti x_tj - s_ij)², the asymptotic
    ///   variance of the sample covariance entries
    /// - ρ̂, the asymptotic covariance between target and sample entries
    ///   (zero for the scaled identity)
    /// - γ̂ = ||F - S||², the misspecification of the target
    fn compute_shrinkage_intensity(&self, moments: &Moments, target: &Array2<f64>) -> f64 {
        let Moments { data, sample_cov } = moments;
        let n = data.nrows() as f64;

        let squares = data.mapv(|v| v * v);

        // π_ij = (1/n) Σ_t x_ti² x_tj² - s_ij²
        let pi = squares.t().dot(&squares) / n - sample_cov.mapv(|s| s * s);
        let pi_hat = pi.sum();

        let rho_hat = match self.config.target {
            ShrinkageTarget::Identity => 0.0,
            ShrinkageTarget::Diagonal => pi.diag().sum(),
            ShrinkageTarget::ConstantCorrelation => {
                constant_correlation_rho(data.view(), &squares, sample_cov, &pi)
            }
        };

        let gamma_hat = squared_distance(sample_cov, target);
        let scale = sample_cov.iter().map(|v| v * v).sum::<f64>();
        let delta = resolve_intensity((pi_hat - rho_hat) / n, gamma_hat, scale);
        debug!(
            target = ?self.config.target,
            pi_hat,
            rho_hat,
            gamma_hat,
            delta,
            "ledoit-wolf shrinkage intensity"
        );
        delta
    }

    /// Shrinkage intensity applied for these observations
    ///
    /// Returns the fixed intensity when one is configured, otherwise the
    /// estimated optimum (useful for diagnostics).
    pub fn shrinkage_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<f64, CovarianceError> {
        let moments = self.moments(observations, dims)?;
        let target = self.shrinkage_target(&moments.sample_cov);
        Ok(self.intensity(&moments, &target))
    }

    /// Shrunk covariance together with the intensity that produced it
    pub fn estimate_with_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<(Array2<f64>, f64), CovarianceError> {
        let moments = self.moments(observations, dims)?;

        // Compute shrinkage target
        let target = self.shrinkage_target(&moments.sample_cov);

        // Compute shrinkage intensity
        let delta = self.intensity(&moments, &target);

        // Apply shrinkage: Σ_LW = δ* F + (1-δ*) S
        Ok((shrink_toward(&moments.sample_cov, &target, delta), delta))
    }

    fn intensity(&self, moments: &Moments, target: &Array2<f64>) -> f64 {
        match self.config.shrinkage {
            Shrinkage::Fixed(rho) => rho,
            Shrinkage::Auto => self.compute_shrinkage_intensity(moments, target),
        }
    }
}

impl CovarianceEstimator for LedoitWolfEstimator {
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_intensity(observations, dims)
            .map(|(covariance, _)| covariance)
    }
}

/// Average pairwise correlation, skipping pairs with a zero variance
fn average_correlation(sample_cov: &Array2<f64>, std_devs: &Array1<f64>) -> f64 {
    let n_variables = sample_cov.nrows();
    let mut sum_corr = 0.0;
    let mut count = 0;
    for i in 0..n_variables {
        for j in (i + 1)..n_variables {
            let scale = std_devs[i] * std_devs[j];
            if scale > 0.0 {
                sum_corr += sample_cov[[i, j]] / scale;
                count += 1;
            }
        }
    }
    if count > 0 {
        sum_corr / count as f64
    } else {
        0.0
    }
}

/// ρ̂ for the constant-correlation target
///
/// ρ̂ = Σ_i π_ii + Σ_{i≠j} (r̄/2) (√(s_jj/s_ii) θ_ii,ij + √(s_ii/s_jj) θ_jj,ij)
///
/// with θ_ii,ij = (1/n) Σ_t (x_ti² - s_ii)(x_ti x_tj - s_ij).
fn constant_correlation_rho(
    data: ArrayView2<'_, f64>,
    squares: &Array2<f64>,
    sample_cov: &Array2<f64>,
    pi: &Array2<f64>,
) -> f64 {
    let n = data.nrows() as f64;
    let n_variables = sample_cov.nrows();
    let variances = sample_cov.diag();
    let std_devs = variances.mapv(f64::sqrt);
    let avg_corr = average_correlation(sample_cov, &std_devs);

    // θ_ii,ij = (1/n) Σ_t x_ti³ x_tj - s_ii s_ij
    let cubes = &squares.view() * &data;
    let theta = Array2::from_shape_fn((n_variables, n_variables), |(i, j)| {
        cubes.column(i).dot(&data.column(j)) / n - variances[i] * sample_cov[[i, j]]
    });

    let mut rho = pi.diag().sum();
    for i in 0..n_variables {
        for j in 0..n_variables {
            if i == j || variances[i] <= 0.0 || variances[j] <= 0.0 {
                continue;
            }
            rho += avg_corr / 2.0
                * ((variances[j] / variances[i]).sqrt() * theta[[i, j]]
                    + (variances[i] / variances[j]).sqrt() * theta[[j, i]]);
        }
    }
    rho
}
