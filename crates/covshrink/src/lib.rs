#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/covshrink/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;

// Re-export main types
pub use covariance::{
    AnalyticalNonlinearShrinkage, CovarianceError, CovarianceEstimator, Dims, LedoitWolfEstimator,
    OracleApproximatingShrinkage, RaoBlackwellLedoitWolf, Shrinkage, ShrinkageEstimator,
    ShrinkageMethod,
};
