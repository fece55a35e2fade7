//! Kernel estimation of the sample spectral density
//!
//! Estimates, at every sample eigenvalue, the density of the sample spectrum
//! and its Hilbert transform. Both use the Epanechnikov kernel with a
//! bandwidth proportional to each reference eigenvalue:
//!
//! x_ij = (λ_i - λ_j) / (h λ_j),  h = η^(-1/3)
//!
//! f̃_i  = mean_j K(x_ij) / (h λ_j)
//! Hf̃_i = mean_j HK(x_ij) / (h λ_j)
//!
//! The Hilbert transform of the kernel is available in closed form, which is
//! what makes the nonlinear shrinkage estimator analytical.

use ndarray::{Array1, ArrayView1, Zip};
use std::f64::consts::PI;

/// √5, the half-width of the kernel support
pub const SQRT_5: f64 = 2.236_067_977_499_79;

/// Normalization of the Epanechnikov kernel, 3 / (4√5)
const KERNEL_SCALE: f64 = 3.0 / (4.0 * SQRT_5);

/// Linear coefficient of the Hilbert-transformed kernel, 3 / (10π)
const HILBERT_SLOPE: f64 = 0.3 / PI;

/// Logarithmic coefficient of the Hilbert-transformed kernel, 3 / (4√5π)
const HILBERT_LOG_SCALE: f64 = 3.0 / (4.0 * SQRT_5 * PI);

/// Relative distance from ±√5 at which the closed-form limit is used
const POLE_TOLERANCE: f64 = 1e-8;

/// Beyond this |x| the far-field series replaces the closed form
const FAR_FIELD: f64 = 20.0;

/// Terms of the far-field series; |√5/x| < 0.112 so the tail is below 1e-20
const FAR_FIELD_TERMS: i32 = 12;

/// Kernel density and Hilbert transform estimates at each eigenvalue
#[derive(Debug, Clone)]
pub struct SpectralDensity {
    /// Density estimate f̃ at each eigenvalue
    pub density: Array1<f64>,
    /// Hilbert transform estimate Hf̃ at each eigenvalue
    pub hilbert: Array1<f64>,
    /// Bandwidth h = η^(-1/3)
    pub bandwidth: f64,
}

/// Kernel bandwidth for effective sample size `eta`
pub fn bandwidth(eta: usize) -> f64 {
    (eta as f64).powf(-1.0 / 3.0)
}

/// Epanechnikov kernel with unit variance
///
/// K(x) = 3/(4√5) · max(0, 1 - x²/5)
pub fn epanechnikov(x: f64) -> f64 {
    KERNEL_SCALE * (1.0 - x * x / 5.0).max(0.0)
}

/// Hilbert transform of the Epanechnikov kernel
///
/// HK(x) = -3x/(10π) + 3/(4√5π) · (1 - x²/5) · ln|(√5 - x)/(√5 + x)|
///
/// The logarithm has poles at x = ±√5 where its coefficient vanishes; the
/// continuous limit -3x/(10π) is returned there. For large |x| the two terms
/// cancel to O(1/x), so an equivalent power series in √5/x is evaluated.
pub fn epanechnikov_hilbert(x: f64) -> f64 {
    let distance = x.abs();
    if (distance - SQRT_5).abs() <= POLE_TOLERANCE * SQRT_5 {
        return -HILBERT_SLOPE * x;
    }
    if distance > FAR_FIELD {
        return far_field_hilbert(x);
    }
    -HILBERT_SLOPE * x
        + HILBERT_LOG_SCALE * (1.0 - x * x / 5.0) * ((SQRT_5 - x) / (SQRT_5 + x)).abs().ln()
}

/// HK(x) = -3/(√5π) · Σ_{k≥1} u^(2k-1) / ((2k-1)(2k+1)),  u = √5/x
fn far_field_hilbert(x: f64) -> f64 {
    let u = SQRT_5 / x;
    let u2 = u * u;
    let mut power = u;
    let mut sum = 0.0;
    for k in 1..=FAR_FIELD_TERMS {
        let odd = f64::from(2 * k - 1);
        sum += power / (odd * (odd + 2.0));
        power *= u2;
    }
    -3.0 / (SQRT_5 * PI) * sum
}

/// Estimate f̃ and Hf̃ over a sorted spectrum
///
/// Every eigenvalue in `eigenvalues` serves both as an evaluation point and
/// as a kernel centre, so the caller passes the already-truncated spectrum.
/// Eigenvalues must be strictly positive.
///
/// Rows are evaluated in parallel; each row mean is accumulated sequentially
/// over the kernel centres in the order given, so results do not depend on
/// the number of threads.
///
/// # Arguments
/// * `eigenvalues` - Retained sample eigenvalues, ascending
/// * `eta` - Effective sample size governing the bandwidth
pub fn spectral_density(eigenvalues: ArrayView1<'_, f64>, eta: usize) -> SpectralDensity {
    let h = bandwidth(eta);
    let m = eigenvalues.len();
    let mut density = Array1::<f64>::zeros(m);
    let mut hilbert = Array1::<f64>::zeros(m);

    if m == 0 {
        return SpectralDensity {
            density,
            hilbert,
            bandwidth: h,
        };
    }

    let count = m as f64;
    Zip::from(&mut density)
        .and(&mut hilbert)
        .and(&eigenvalues)
        .par_for_each(|f, hf, &lambda_i| {
            let mut f_sum = 0.0;
            let mut hf_sum = 0.0;
            for &lambda_j in eigenvalues.iter() {
                let scale = h * lambda_j;
                let x = (lambda_i - lambda_j) / scale;
                f_sum += epanechnikov(x) / scale;
                hf_sum += epanechnikov_hilbert(x) / scale;
            }
            *f = f_sum / count;
            *hf = hf_sum / count;
        });

    SpectralDensity {
        density,
        hilbert,
        bandwidth: h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;
    use rstest::rstest;

    /// General closed form without any special-casing
    fn closed_form(x: f64) -> f64 {
        -HILBERT_SLOPE * x
            + HILBERT_LOG_SCALE * (1.0 - x * x / 5.0) * ((SQRT_5 - x) / (SQRT_5 + x)).abs().ln()
    }

    #[test]
    fn test_sqrt_5_constant() {
        assert_relative_eq!(SQRT_5, 5.0_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_kernel_shape() {
        assert_relative_eq!(epanechnikov(0.0), KERNEL_SCALE, epsilon = 1e-15);
        assert_relative_eq!(epanechnikov(1.0), epanechnikov(-1.0), epsilon = 1e-15);
        assert_eq!(epanechnikov(SQRT_5), 0.0);
        assert_eq!(epanechnikov(3.0), 0.0);
        assert_eq!(epanechnikov(-10.0), 0.0);
    }

    #[test]
    fn test_kernel_integrates_to_one() {
        let steps = 200_000;
        let dx = 2.0 * SQRT_5 / steps as f64;
        let integral: f64 = (0..steps)
            .map(|i| epanechnikov(-SQRT_5 + (i as f64 + 0.5) * dx) * dx)
            .sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_hilbert_is_odd() {
        for x in [0.3, 1.7, 2.0, 4.0, 12.0, 50.0] {
            assert_relative_eq!(
                epanechnikov_hilbert(-x),
                -epanechnikov_hilbert(x),
                epsilon = 1e-15
            );
        }
        assert_eq!(epanechnikov_hilbert(0.0), 0.0);
    }

    #[rstest]
    #[case(SQRT_5)]
    #[case(-SQRT_5)]
    fn test_hilbert_at_pole_uses_limit(#[case] x: f64) {
        let value = epanechnikov_hilbert(x);
        assert!(value.is_finite());
        // -3x/(10π) = -3/(2√5π) · sign(x) at the pole
        assert_relative_eq!(value, -3.0 / (2.0 * SQRT_5 * PI) * x.signum(), epsilon = 1e-14);
    }

    #[rstest]
    #[case(1e-6)]
    #[case(1e-4)]
    fn test_hilbert_continuous_across_pole(#[case] offset: f64) {
        let at_pole = epanechnikov_hilbert(SQRT_5);
        assert_abs_diff_eq!(epanechnikov_hilbert(SQRT_5 - offset), at_pole, epsilon = 1e-3);
        assert_abs_diff_eq!(epanechnikov_hilbert(SQRT_5 + offset), at_pole, epsilon = 1e-3);
        // Just outside the tolerance band the general formula is used and stays finite
        assert!(closed_form(SQRT_5 + offset).is_finite());
    }

    #[rstest]
    #[case(20.5)]
    #[case(-25.0)]
    #[case(40.0)]
    fn test_far_field_matches_closed_form(#[case] x: f64) {
        assert_relative_eq!(far_field_hilbert(x), closed_form(x), max_relative = 1e-9);
    }

    #[test]
    fn test_far_field_decays_like_inverse() {
        let x = 1e9;
        assert_relative_eq!(epanechnikov_hilbert(x), -1.0 / (PI * x), max_relative = 1e-12);
        assert_relative_eq!(epanechnikov_hilbert(-x), 1.0 / (PI * x), max_relative = 1e-12);
    }

    #[test]
    fn test_bandwidth() {
        assert_relative_eq!(bandwidth(8), 0.5, epsilon = 1e-15);
        assert_relative_eq!(bandwidth(1000), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_single_eigenvalue() {
        let eigenvalues = array![2.0];
        let estimate = spectral_density(eigenvalues.view(), 8);

        // Only the diagonal term: K(0) / (h λ) and HK(0) = 0
        assert_relative_eq!(estimate.density[0], KERNEL_SCALE / (0.5 * 2.0), epsilon = 1e-14);
        assert_eq!(estimate.hilbert[0], 0.0);
        assert_relative_eq!(estimate.bandwidth, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_pair_of_eigenvalues_by_hand() {
        let eigenvalues = array![1.0, 1.5];
        let h = bandwidth(27); // 1/3
        let estimate = spectral_density(eigenvalues.view(), 27);

        let x10 = (1.5 - 1.0) / (h * 1.0);
        let x01 = (1.0 - 1.5) / (h * 1.5);

        let f0 = (epanechnikov(0.0) / h + epanechnikov(x01) / (h * 1.5)) / 2.0;
        let f1 = (epanechnikov(x10) / h + epanechnikov(0.0) / (h * 1.5)) / 2.0;
        let hf0 = epanechnikov_hilbert(x01) / (h * 1.5) / 2.0;
        let hf1 = epanechnikov_hilbert(x10) / h / 2.0;

        assert_relative_eq!(estimate.density[0], f0, epsilon = 1e-14);
        assert_relative_eq!(estimate.density[1], f1, epsilon = 1e-14);
        assert_relative_eq!(estimate.hilbert[0], hf0, epsilon = 1e-14);
        assert_relative_eq!(estimate.hilbert[1], hf1, epsilon = 1e-14);

        // Lower eigenvalue sees mass above it, upper sees mass below
        assert!(estimate.hilbert[0] > 0.0);
        assert!(estimate.hilbert[1] < 0.0);
    }

    #[test]
    fn test_grid_point_on_pole() {
        // λ_i = λ_j (1 + h√5) puts x_ij exactly on the pole
        let h = bandwidth(64); // 0.25
        let eigenvalues = array![1.0, 1.0 + h * SQRT_5];
        let estimate = spectral_density(eigenvalues.view(), 64);

        assert!(estimate.density.iter().all(|v| v.is_finite()));
        assert!(estimate.hilbert.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_parallel_rows_are_deterministic() {
        let eigenvalues = Array1::from_iter((1..=200).map(|i| 0.1 * i as f64));
        let first = spectral_density(eigenvalues.view(), 150);
        let second = spectral_density(eigenvalues.view(), 150);
        assert_eq!(first.density, second.density);
        assert_eq!(first.hilbert, second.hilbert);
    }

    #[test]
    fn test_empty_spectrum() {
        let eigenvalues = Array1::<f64>::zeros(0);
        let estimate = spectral_density(eigenvalues.view(), 20);
        assert!(estimate.density.is_empty());
        assert!(estimate.hilbert.is_empty());
    }
}
