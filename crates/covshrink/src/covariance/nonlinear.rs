//! Analytical Nonlinear Shrinkage Covariance Estimator
//!
//! Implements the estimator from:
//! "Analytical Nonlinear Shrinkage of Large-Dimensional Covariance Matrices"
//! (Ledoit & Wolf, 2020)
//!
//! Instead of pulling the whole sample covariance toward a target with one
//! scalar, every sample eigenvalue is replaced by a nonparametric estimate of
//! the population eigenvalue in its direction. The replacement is computed
//! from a kernel estimate of the sample spectral density f̃ and its Hilbert
//! transform Hf̃ (see [`super::kernel`]):
//!
//! Σ_NL = U diag(d̃) U^T
//!
//! where U holds the sample eigenvectors and d̃ the shrunk eigenvalues.
//!
//! With η the effective sample size (n if p < n, else n - 1) and γ = p/η:
//! - p < n:  d̃_i = λ_i / ((γπλ_i f̃_i)² + (1 - γ - γπλ_i Hf̃_i)²)
//! - p ≥ n:  the p - η null eigenvalues share d̃₀ = 1 / (π (γ - 1) Hf̃₀),
//!   the top η get d̃_i = 1 / (π² λ_i (f̃_i² + Hf̃_i²))

use super::kernel::{SQRT_5, spectral_density};
use super::sample::sample_covariance;
use super::utils::{EigenDecomposition, reconstruct_from_eigen, symmetric_eigen};
use super::{CovarianceError, CovarianceEstimator, Dims};
use ndarray::{Array1, Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Minimum number of observations for a meaningful kernel bandwidth
pub const MIN_OBSERVATIONS: usize = 12;

/// Retained eigenvalues are floored at this fraction of the largest one
const EIGENVALUE_FLOOR: f64 = 1e-12;

/// Analytical nonlinear shrinkage configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NonlinearShrinkageConfig {
    /// Build the sample covariance with Bessel's correction (divide by n - 1)
    pub corrected: bool,
}

/// Analytical nonlinear shrinkage covariance estimator
#[derive(Debug, Default, Clone)]
pub struct AnalyticalNonlinearShrinkage {
    config: NonlinearShrinkageConfig,
}

/// Which closed form produced the shrunk eigenvalues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regime {
    /// More observations than variables
    Overdetermined,
    /// At least as many variables as observations
    Underdetermined,
}

impl AnalyticalNonlinearShrinkage {
    /// Create a new estimator with the given configuration
    pub const fn new(config: NonlinearShrinkageConfig) -> Self {
        Self { config }
    }

    /// Estimator configuration
    pub const fn config(&self) -> &NonlinearShrinkageConfig {
        &self.config
    }

    /// Estimate the covariance matrix, optionally reusing a decomposition
    ///
    /// # Arguments
    /// * `observations` - Data matrix laid out according to `dims`
    /// * `dims` - Whether observations run along rows or columns
    /// * `decomposition` - Eigenpairs of the sample covariance computed
    ///   elsewhere; any order is accepted. When `None` they are computed here.
    pub fn estimate_with_decomposition(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
        decomposition: Option<&EigenDecomposition>,
    ) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_spectrum(observations, dims, decomposition)
            .map(|(covariance, _)| covariance)
    }

    /// Estimated covariance together with its shrunk eigenvalues d̃
    pub fn estimate_with_spectrum(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
        decomposition: Option<&EigenDecomposition>,
    ) -> Result<(Array2<f64>, Array1<f64>), CovarianceError> {
        let (shrunk, eigen) = self.shrink(observations, dims, decomposition)?;
        let covariance = reconstruct_from_eigen(&shrunk, &eigen.eigenvectors)?;
        Ok((covariance, shrunk))
    }

    /// Shrunk eigenvalues d̃, paired with the ascending sample eigenvalues
    pub fn shrunk_eigenvalues(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
        decomposition: Option<&EigenDecomposition>,
    ) -> Result<Array1<f64>, CovarianceError> {
        self.shrink(observations, dims, decomposition)
            .map(|(shrunk, _)| shrunk)
    }

    fn shrink(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
        decomposition: Option<&EigenDecomposition>,
    ) -> Result<(Array1<f64>, EigenDecomposition), CovarianceError> {
        let n_observations = match dims {
            Dims::Rows => observations.nrows(),
            Dims::Columns => observations.ncols(),
        };
        if n_observations < MIN_OBSERVATIONS {
            return Err(CovarianceError::InsufficientSamples {
                required: MIN_OBSERVATIONS,
                actual: n_observations,
            });
        }

        let sample = sample_covariance(observations, dims, self.config.corrected)?;
        let p = sample.n_variables;

        let eigen = match decomposition {
            Some(decomp) => {
                if decomp.len() != p {
                    return Err(CovarianceError::DimensionMismatch {
                        expected: p,
                        actual: decomp.len(),
                    });
                }
                decomp.sorted_ascending()?
            }
            None => symmetric_eigen(&sample.matrix)?,
        };

        let shrunk = shrink_spectrum(eigen.eigenvalues.view(), sample.n_observations)?;
        Ok((shrunk, eigen))
    }
}

impl CovarianceEstimator for AnalyticalNonlinearShrinkage {
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError> {
        self.estimate_with_decomposition(observations, dims, None)
    }
}

/// Effective sample size: n if p < n, otherwise n - 1
pub const fn effective_sample_size(n: usize, p: usize) -> usize {
    if p < n { n } else { n.saturating_sub(1) }
}

/// Shrink an ascending sample spectrum of length p drawn from n observations
pub(crate) fn shrink_spectrum(
    eigenvalues: ArrayView1<'_, f64>,
    n: usize,
) -> Result<Array1<f64>, CovarianceError> {
    let p = eigenvalues.len();
    let eta = effective_sample_size(n, p);
    let retained_len = p.min(eta);

    let largest = if p == 0 { 0.0 } else { eigenvalues[p - 1] };
    if !largest.is_finite() || largest <= 0.0 {
        return Err(CovarianceError::DegenerateSpectrum);
    }

    let floor = largest * EIGENVALUE_FLOOR;
    let retained = eigenvalues.slice(s![p - retained_len..]);
    let floored = retained.iter().filter(|&&v| v < floor).count();
    if floored > 0 {
        warn!(floored, floor, "flooring near-zero retained eigenvalues");
    }
    let lambda = retained.mapv(|v| v.max(floor));

    let regime = if p < n {
        Regime::Overdetermined
    } else {
        Regime::Underdetermined
    };
    let density = spectral_density(lambda.view(), eta);
    debug!(
        p,
        n,
        eta,
        bandwidth = density.bandwidth,
        ?regime,
        "analytical nonlinear shrinkage"
    );

    let gamma = p as f64 / eta as f64;
    let shrunk = match regime {
        Regime::Overdetermined => {
            shrink_overdetermined(lambda.view(), &density.density, &density.hilbert, gamma)
        }
        Regime::Underdetermined => shrink_underdetermined(
            lambda.view(),
            &density.density,
            &density.hilbert,
            gamma,
            density.bandwidth,
            p - retained_len,
        ),
    };
    Ok(shrunk)
}

/// p < n: every eigenvalue is retained
pub(crate) fn shrink_overdetermined(
    lambda: ArrayView1<'_, f64>,
    density: &Array1<f64>,
    hilbert: &Array1<f64>,
    gamma: f64,
) -> Array1<f64> {
    let mut shrunk = Array1::zeros(lambda.len());
    for (i, (d, ((&l, &f), &hf))) in shrunk
        .iter_mut()
        .zip(lambda.iter().zip(density).zip(hilbert))
        .enumerate()
    {
        let scaled = gamma * PI * l;
        let denominator = (scaled * f).powi(2) + (1.0 - gamma - scaled * hf).powi(2);
        *d = guarded_quotient(l, denominator, 1.0, l, i);
    }
    shrunk
}

/// p ≥ n: the p - η null directions share one value, the rest are retained
pub(crate) fn shrink_underdetermined(
    lambda: ArrayView1<'_, f64>,
    density: &Array1<f64>,
    hilbert: &Array1<f64>,
    gamma: f64,
    bandwidth: f64,
    discarded: usize,
) -> Array1<f64> {
    let mut shrunk = Array1::zeros(discarded + lambda.len());

    if discarded > 0 {
        let hilbert_null = null_hilbert(lambda, bandwidth);
        let smallest = lambda.first().copied().unwrap_or(0.0);
        let largest = lambda.last().copied().unwrap_or(0.0);
        let null_value = guarded_quotient(
            1.0 / PI,
            (gamma - 1.0) * hilbert_null,
            largest,
            smallest,
            0,
        );
        shrunk.slice_mut(s![..discarded]).fill(null_value);
    }

    let tail = shrunk.slice_mut(s![discarded..]);
    for (i, (d, ((&l, &f), &hf))) in tail
        .into_iter()
        .zip(lambda.iter().zip(density).zip(hilbert))
        .enumerate()
    {
        let denominator = PI * PI * l * (f * f + hf * hf);
        *d = guarded_quotient(1.0, denominator, l, l, discarded + i);
    }
    shrunk
}

/// Hilbert transform of the density at zero, in closed form
///
/// Hf̃₀ = mean(1/(πλ)) · (3/(10h²) + 3/(4√5h) · (1 - 1/(5h²)) · ln|(1 + √5h)/(1 - √5h)|)
pub(crate) fn null_hilbert(lambda: ArrayView1<'_, f64>, bandwidth: f64) -> f64 {
    let h = bandwidth;
    let inverse_mean = lambda.iter().map(|&l| 1.0 / (PI * l)).sum::<f64>() / lambda.len() as f64;
    let t = SQRT_5 * h;

    // At √5h = 1 the log term's coefficient vanishes faster than the log grows
    let log_term = if (t - 1.0).abs() <= f64::EPSILON {
        0.0
    } else {
        0.75 / t * (1.0 - 0.2 / (h * h)) * ((1.0 + t) / (1.0 - t)).abs().ln()
    };
    inverse_mean * (0.3 / (h * h) + log_term)
}

/// `numerator / denominator`, or `fallback` when the denominator degenerates
///
/// `scale` makes the denominator dimensionless before it is compared with
/// machine epsilon, so the outcome does not depend on the units of the data.
fn guarded_quotient(
    numerator: f64,
    denominator: f64,
    scale: f64,
    fallback: f64,
    index: usize,
) -> f64 {
    let value = numerator / denominator;
    if (denominator * scale).abs() <= f64::EPSILON || !value.is_finite() || value < 0.0 {
        warn!(
            index,
            denominator, fallback, "degenerate shrinkage denominator, keeping sample eigenvalue"
        );
        fallback
    } else {
        value
    }
}
