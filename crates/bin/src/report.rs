//! Running estimators and shaping their results for output.

use clap::ValueEnum;
use covshrink::covariance::{
    AnalyticalNonlinearShrinkage, CovarianceError, Dims, LedoitWolfConfig,
    LedoitWolfEstimator, NonlinearShrinkageConfig, OasConfig, OracleApproximatingShrinkage,
    RaoBlackwellConfig, RaoBlackwellLedoitWolf, Shrinkage, ShrinkageEstimator, ShrinkageMethod,
    ShrinkageTarget, condition_number, sample_covariance, symmetric_eigen,
};
use ndarray::Array2;
use serde::Serialize;
use tracing::info;

/// Ledoit-Wolf target as accepted on the command line
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum TargetArg {
    /// Scaled identity
    #[default]
    Identity,
    /// Constant correlation
    ConstantCorrelation,
    /// Sample variances only
    Diagonal,
}

impl From<TargetArg> for ShrinkageTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Identity => Self::Identity,
            TargetArg::ConstantCorrelation => Self::ConstantCorrelation,
            TargetArg::Diagonal => Self::Diagonal,
        }
    }
}

/// Everything needed to build one estimator
#[derive(Debug, Clone, Copy)]
pub(crate) struct EstimatorSettings {
    pub(crate) method: ShrinkageMethod,
    pub(crate) shrinkage: Shrinkage,
    pub(crate) target: ShrinkageTarget,
    pub(crate) corrected: bool,
}

impl EstimatorSettings {
    /// Settings for a method with automatic shrinkage
    pub(crate) fn auto(method: ShrinkageMethod, corrected: bool) -> Self {
        Self {
            method,
            shrinkage: Shrinkage::Auto,
            target: ShrinkageTarget::default(),
            corrected,
        }
    }

    pub(crate) fn build(&self) -> Result<ShrinkageEstimator, CovarianceError> {
        let shrinkage = self.shrinkage;
        let estimator = match self.method {
            ShrinkageMethod::LedoitWolf => LedoitWolfEstimator::new(LedoitWolfConfig {
                target: self.target,
                shrinkage,
                ..Default::default()
            })?
            .into(),
            ShrinkageMethod::RaoBlackwell => RaoBlackwellLedoitWolf::new(RaoBlackwellConfig {
                shrinkage,
                ..Default::default()
            })?
            .into(),
            ShrinkageMethod::Oas => OracleApproximatingShrinkage::new(OasConfig {
                shrinkage,
                ..Default::default()
            })?
            .into(),
            ShrinkageMethod::Nonlinear => AnalyticalNonlinearShrinkage::new(
                NonlinearShrinkageConfig {
                    corrected: self.corrected,
                },
            )
            .into(),
        };
        Ok(estimator)
    }
}

/// Condition numbers of the sample and shrunk matrices
#[derive(Debug, Serialize)]
pub(crate) struct Conditioning {
    /// `null` when the sample covariance is singular
    pub(crate) sample: Option<f64>,
    pub(crate) estimate: Option<f64>,
}

/// Output of the `estimate` subcommand
#[derive(Debug, Serialize)]
pub(crate) struct EstimateReport {
    pub(crate) method: ShrinkageMethod,
    pub(crate) n_observations: usize,
    pub(crate) n_variables: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) shrinkage_intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) shrunk_eigenvalues: Option<Vec<f64>>,
    pub(crate) condition_number: Conditioning,
    pub(crate) covariance: Vec<Vec<f64>>,
}

/// One line of the `compare` subcommand
#[derive(Debug, Serialize)]
pub(crate) struct ComparisonEntry {
    pub(crate) method: ShrinkageMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) shrinkage_intensity: Option<f64>,
    pub(crate) condition_number: Option<f64>,
}

/// Output of the `compare` subcommand
#[derive(Debug, Serialize)]
pub(crate) struct ComparisonReport {
    pub(crate) n_observations: usize,
    pub(crate) n_variables: usize,
    pub(crate) sample_condition_number: Option<f64>,
    pub(crate) estimators: Vec<ComparisonEntry>,
}

pub(crate) fn estimate(
    observations: &Array2<f64>,
    dims: Dims,
    settings: &EstimatorSettings,
) -> Result<EstimateReport, CovarianceError> {
    let sample = sample_covariance(observations, dims, settings.corrected)?;
    let decomposition = symmetric_eigen(&sample.matrix)?;
    let estimator = settings.build()?;
    info!(method = %settings.method, n = sample.n_observations, p = sample.n_variables, "estimating covariance");

    let estimate = estimator.estimate_with_details(observations, dims, Some(&decomposition))?;

    Ok(EstimateReport {
        method: settings.method,
        n_observations: sample.n_observations,
        n_variables: sample.n_variables,
        shrinkage_intensity: estimate.shrinkage_intensity,
        shrunk_eigenvalues: estimate.shrunk_eigenvalues.map(|d| d.to_vec()),
        condition_number: Conditioning {
            sample: finite(decomposition.condition_number()),
            estimate: finite(condition_number(&estimate.covariance)),
        },
        covariance: estimate
            .covariance
            .outer_iter()
            .map(|row| row.to_vec())
            .collect(),
    })
}

pub(crate) fn compare(
    observations: &Array2<f64>,
    dims: Dims,
    corrected: bool,
) -> Result<ComparisonReport, CovarianceError> {
    let sample = sample_covariance(observations, dims, corrected)?;
    let decomposition = symmetric_eigen(&sample.matrix)?;

    let estimators = ShrinkageMethod::ALL
        .into_iter()
        .map(|method| {
            let estimator = EstimatorSettings::auto(method, corrected).build()?;
            let estimate =
                estimator.estimate_with_details(observations, dims, Some(&decomposition))?;
            Ok(ComparisonEntry {
                method,
                shrinkage_intensity: estimate.shrinkage_intensity,
                condition_number: finite(condition_number(&estimate.covariance)),
            })
        })
        .collect::<Result<Vec<_>, CovarianceError>>()?;

    Ok(ComparisonReport {
        n_observations: sample.n_observations,
        n_variables: sample.n_variables,
        sample_condition_number: finite(decomposition.condition_number()),
        estimators,
    })
}

/// JSON has no infinity
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
