//! Runtime selection among the shrinkage estimators
//!
//! [`ShrinkageEstimator`] wraps one estimator and forwards the
//! [`CovarianceEstimator`] contract to it.

use super::ledoit_wolf::LedoitWolfEstimator;
use super::nonlinear::AnalyticalNonlinearShrinkage;
use super::oas::OracleApproximatingShrinkage;
use super::rao_blackwell::RaoBlackwellLedoitWolf;
use super::utils::EigenDecomposition;
use super::{CovarianceError, CovarianceEstimator, Dims};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shrinkage method identifiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ShrinkageMethod {
    /// Ledoit-Wolf linear shrinkage
    LedoitWolf,
    /// Rao-Blackwell Ledoit-Wolf
    RaoBlackwell,
    /// Oracle approximating shrinkage
    Oas,
    /// Analytical nonlinear shrinkage
    Nonlinear,
}

impl ShrinkageMethod {
    /// All methods, linear ones first
    pub const ALL: [Self; 4] = [Self::LedoitWolf, Self::RaoBlackwell, Self::Oas, Self::Nonlinear];

    /// Short name used on the command line and in reports
    pub const fn name(self) -> &'static str {
        match self {
            Self::LedoitWolf => "lw",
            Self::RaoBlackwell => "rblw",
            Self::Oas => "oas",
            Self::Nonlinear => "nonlinear",
        }
    }

    /// Whether the method applies one scalar intensity to a target
    pub const fn is_linear(self) -> bool {
        !matches!(self, Self::Nonlinear)
    }
}

impl fmt::Display for ShrinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShrinkageMethod {
    type Err = CovarianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lw" | "ledoit-wolf" => Ok(Self::LedoitWolf),
            "rblw" | "rao-blackwell" => Ok(Self::RaoBlackwell),
            "oas" => Ok(Self::Oas),
            "nonlinear" | "nls" => Ok(Self::Nonlinear),
            other => Err(CovarianceError::InvalidArgument(format!(
                "unknown shrinkage method {other:?}"
            ))),
        }
    }
}

/// Covariance estimate with the quantities that produced it
#[derive(Debug, Clone)]
pub struct ShrinkageEstimate {
    /// Shrunk covariance matrix (p × p)
    pub covariance: Array2<f64>,
    /// Intensity of a linear estimator
    pub shrinkage_intensity: Option<f64>,
    /// Shrunk eigenvalues of the nonlinear estimator, ascending with the
    /// sample eigenvalues
    pub shrunk_eigenvalues: Option<Array1<f64>>,
}

/// One of the shrinkage estimators, chosen at runtime
#[derive(Debug, Clone)]
pub enum ShrinkageEstimator {
    /// Ledoit-Wolf linear shrinkage
    LedoitWolf(LedoitWolfEstimator),
    /// Rao-Blackwell Ledoit-Wolf
    RaoBlackwell(RaoBlackwellLedoitWolf),
    /// Oracle approximating shrinkage
    Oas(OracleApproximatingShrinkage),
    /// Analytical nonlinear shrinkage
    Nonlinear(AnalyticalNonlinearShrinkage),
}

impl ShrinkageEstimator {
    /// Default-configured estimator for a method
    pub fn from_method(method: ShrinkageMethod) -> Self {
        match method {
            ShrinkageMethod::LedoitWolf => Self::LedoitWolf(LedoitWolfEstimator::default()),
            ShrinkageMethod::RaoBlackwell => {
                Self::RaoBlackwell(RaoBlackwellLedoitWolf::default())
            }
            ShrinkageMethod::Oas => Self::Oas(OracleApproximatingShrinkage::default()),
            ShrinkageMethod::Nonlinear => {
                Self::Nonlinear(AnalyticalNonlinearShrinkage::default())
            }
        }
    }

    /// Method of the wrapped estimator
    pub const fn method(&self) -> ShrinkageMethod {
        match self {
            Self::LedoitWolf(_) => ShrinkageMethod::LedoitWolf,
            Self::RaoBlackwell(_) => ShrinkageMethod::RaoBlackwell,
            Self::Oas(_) => ShrinkageMethod::Oas,
            Self::Nonlinear(_) => ShrinkageMethod::Nonlinear,
        }
    }

    /// Shrinkage intensity of a linear estimator, `None` for the nonlinear one
    pub fn shrinkage_intensity(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Option<f64>, CovarianceError> {
        match self {
            Self::LedoitWolf(e) => e.shrinkage_intensity(observations, dims).map(Some),
            Self::RaoBlackwell(e) => e.shrinkage_intensity(observations, dims).map(Some),
            Self::Oas(e) => e.shrinkage_intensity(observations, dims).map(Some),
            Self::Nonlinear(_) => Ok(None),
        }
    }

    /// Estimate the covariance and keep the intensity or shrunk spectrum
    ///
    /// `decomposition` is the eigendecomposition of the sample covariance the
    /// nonlinear estimator would build; the linear estimators ignore it.
    pub fn estimate_with_details(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
        decomposition: Option<&EigenDecomposition>,
    ) -> Result<ShrinkageEstimate, CovarianceError> {
        let linear = |(covariance, rho): (Array2<f64>, f64)| ShrinkageEstimate {
            covariance,
            shrinkage_intensity: Some(rho),
            shrunk_eigenvalues: None,
        };
        match self {
            Self::LedoitWolf(e) => e.estimate_with_intensity(observations, dims).map(linear),
            Self::RaoBlackwell(e) => e.estimate_with_intensity(observations, dims).map(linear),
            Self::Oas(e) => e.estimate_with_intensity(observations, dims).map(linear),
            Self::Nonlinear(e) => e
                .estimate_with_spectrum(observations, dims, decomposition)
                .map(|(covariance, shrunk)| ShrinkageEstimate {
                    covariance,
                    shrinkage_intensity: None,
                    shrunk_eigenvalues: Some(shrunk),
                }),
        }
    }
}

impl From<LedoitWolfEstimator> for ShrinkageEstimator {
    fn from(estimator: LedoitWolfEstimator) -> Self {
        Self::LedoitWolf(estimator)
    }
}

impl From<RaoBlackwellLedoitWolf> for ShrinkageEstimator {
    fn from(estimator: RaoBlackwellLedoitWolf) -> Self {
        Self::RaoBlackwell(estimator)
    }
}

impl From<OracleApproximatingShrinkage> for ShrinkageEstimator {
    fn from(estimator: OracleApproximatingShrinkage) -> Self {
        Self::Oas(estimator)
    }
}

impl From<AnalyticalNonlinearShrinkage> for ShrinkageEstimator {
    fn from(estimator: AnalyticalNonlinearShrinkage) -> Self {
        Self::Nonlinear(estimator)
    }
}

impl CovarianceEstimator for ShrinkageEstimator {
    fn estimate(
        &self,
        observations: &Array2<f64>,
        dims: Dims,
    ) -> Result<Array2<f64>, CovarianceError> {
        match self {
            Self::LedoitWolf(e) => e.estimate(observations, dims),
            Self::RaoBlackwell(e) => e.estimate(observations, dims),
            Self::Oas(e) => e.estimate(observations, dims),
            Self::Nonlinear(e) => e.estimate(observations, dims),
        }
    }
}
