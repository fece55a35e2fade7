//! Shared pieces of the linear shrinkage estimators
//!
//! Every linear estimator has the form:
//! Σ = ρ F + (1-ρ) S
//!
//! where S is the sample covariance, F a structured target and ρ ∈ [0, 1]
//! the shrinkage intensity, either fixed by the caller or estimated.

use super::CovarianceError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Shrinkage intensity selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Shrinkage {
    /// Estimate the optimal intensity from the data
    #[default]
    Auto,
    /// Use a fixed intensity in [0, 1]
    Fixed(f64),
}

impl Shrinkage {
    /// Reject fixed intensities outside [0, 1]
    pub fn validate(self) -> Result<Self, CovarianceError> {
        match self {
            Self::Fixed(rho) if !(0.0..=1.0).contains(&rho) => {
                Err(CovarianceError::InvalidShrinkage(rho))
            }
            other => Ok(other),
        }
    }
}

impl FromStr for Shrinkage {
    type Err = CovarianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let rho: f64 = s.trim().parse().map_err(|_| {
            CovarianceError::InvalidArgument(format!(
                "shrinkage should be \"auto\" or a number in [0, 1], got {s:?}"
            ))
        })?;
        Self::Fixed(rho).validate()
    }
}

impl fmt::Display for Shrinkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fixed(rho) => write!(f, "{rho}"),
        }
    }
}

/// Resolve an intensity ratio to [0, 1]
///
/// `scale` carries the units of the denominator, usually the squared
/// Frobenius norm of S. When the denominator is at or below machine epsilon
/// relative to it (the sample covariance already equals the target) the ratio
/// is not formed; the intensity is 1 if the numerator is positive and 0
/// otherwise.
pub(crate) fn resolve_intensity(numerator: f64, denominator: f64, scale: f64) -> f64 {
    if denominator <= f64::EPSILON * scale.abs() {
        warn!(
            numerator,
            denominator, scale, "degenerate shrinkage target, resolving intensity directly"
        );
        if numerator > 0.0 { 1.0 } else { 0.0 }
    } else {
        (numerator / denominator).clamp(0.0, 1.0)
    }
}

/// Apply shrinkage: Σ = ρ F + (1-ρ) S
pub(crate) fn shrink_toward(sample: &Array2<f64>, target: &Array2<f64>, rho: f64) -> Array2<f64> {
    target * rho + sample * (1.0 - rho)
}

/// Identity scaled by the average variance: F = μ I where μ = trace(S)/p
pub(crate) fn scaled_identity(sample: &Array2<f64>) -> Array2<f64> {
    let p = sample.nrows();
    let mu = sample.diag().sum() / p as f64;
    Array2::eye(p) * mu
}

/// Squared Frobenius norm of the difference of two matrices
pub(crate) fn squared_distance(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_shrinkage_default() {
        assert_eq!(Shrinkage::default(), Shrinkage::Auto);
    }

    #[rstest]
    #[case("auto", Shrinkage::Auto)]
    #[case("AUTO", Shrinkage::Auto)]
    #[case("0", Shrinkage::Fixed(0.0))]
    #[case("0.25", Shrinkage::Fixed(0.25))]
    #[case("1", Shrinkage::Fixed(1.0))]
    fn test_parse_shrinkage(#[case] input: &str, #[case] expected: Shrinkage) {
        assert_eq!(input.parse::<Shrinkage>().unwrap(), expected);
    }

    #[rstest]
    #[case("1.5")]
    #[case("-0.1")]
    fn test_parse_out_of_range(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Shrinkage>(),
            Err(CovarianceError::InvalidShrinkage(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            "lots".parse::<Shrinkage>(),
            Err(CovarianceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(Shrinkage::Auto.to_string(), "auto");
        assert_eq!(Shrinkage::Fixed(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Shrinkage::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
    }

    #[rstest]
    #[case(0.3, 1.0, 1.0, 0.3)]
    #[case(2.0, 1.0, 1.0, 1.0)]
    #[case(-0.5, 1.0, 1.0, 0.0)]
    #[case(0.4, 0.0, 1.0, 1.0)]
    #[case(0.0, 0.0, 1.0, 0.0)]
    #[case(-1.0, 1e-20, 1.0, 0.0)]
    #[case(0.4, 1e-17, 1.0, 1.0)]
    #[case(0.0, 0.0, 0.0, 0.0)]
    #[case(1e-24, 4e-24, 4e-24, 0.25)]
    fn test_resolve_intensity(
        #[case] num: f64,
        #[case] den: f64,
        #[case] scale: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(resolve_intensity(num, den, scale), expected);
    }

    #[test]
    fn test_shrink_toward_endpoints() {
        let sample = array![[2.0, 0.5], [0.5, 1.0]];
        let target = scaled_identity(&sample);

        assert_eq!(shrink_toward(&sample, &target, 0.0), sample);
        assert_eq!(shrink_toward(&sample, &target, 1.0), target);

        let half = shrink_toward(&sample, &target, 0.5);
        assert_relative_eq!(half[[0, 1]], 0.25, epsilon = 1e-15);
        assert_relative_eq!(half[[0, 0]], 1.75, epsilon = 1e-15);
    }

    #[test]
    fn test_scaled_identity() {
        let sample = array![[4.0, 1.0, 0.5], [1.0, 9.0, 1.5], [0.5, 1.5, 16.0]];
        let target = scaled_identity(&sample);
        let mu = 29.0 / 3.0;

        assert_relative_eq!(target[[0, 0]], mu, epsilon = 1e-12);
        assert_relative_eq!(target[[2, 2]], mu, epsilon = 1e-12);
        assert_eq!(target[[0, 1]], 0.0);
        assert_relative_eq!(squared_distance(&sample, &sample), 0.0);
    }
}
