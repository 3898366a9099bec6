//! Error taxonomy for the analysis pipeline
//!
//! Errors local to one metric or one sub-analysis are downgraded by the
//! analyzer; only batch-level failures reach the caller.

use thiserror::Error;

/// Errors produced by the analysis pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Fewer points than a sub-analysis needs
    #[error("Insufficient data: {actual} points, need {required}")]
    InsufficientData { required: usize, actual: usize },

    /// A seasonal, ARIMA-like or decomposition model could not be fitted
    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    /// A record without a usable date or numeric column
    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Nothing left to analyze after dropping malformed records and columns
    #[error("No usable records or numeric columns in input batch")]
    NoUsableData,

    /// Forecast horizon must be a positive number of days
    #[error("Invalid forecast horizon: {0}")]
    InvalidHorizon(usize),

    /// Requested metric is not a numeric column of the batch
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Risk model loading or inference failure
    #[error("Risk model error: {0}")]
    Model(String),
}

impl AnalysisError {
    /// Short machine-readable kind, used in logs and the `degraded` list
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientData { .. } => "insufficient_data",
            AnalysisError::Decomposition(_) => "decomposition",
            AnalysisError::MalformedRecord { .. } => "malformed_record",
            AnalysisError::NoUsableData => "no_usable_data",
            AnalysisError::InvalidHorizon(_) => "invalid_horizon",
            AnalysisError::UnknownMetric(_) => "unknown_metric",
            AnalysisError::Model(_) => "model",
        }
    }

    pub(crate) fn insufficient(required: usize, actual: usize) -> Self {
        AnalysisError::InsufficientData { required, actual }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
