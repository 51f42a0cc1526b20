//! Error taxonomy for the preprocessing pipeline

use polars::prelude::PolarsError;
use thiserror::Error;

/// Result alias used throughout the pipeline
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Every fit/apply step either succeeds with a well-formed frame or fails
/// with one of these kinds.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid thresholds, missing label column, empty dataset
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Zero-variance or all-missing predictor, malformed label values
    #[error("Data quality error in column '{column}': {reason}")]
    DataQuality { column: String, reason: String },

    /// A step removed every predictor
    #[error("Degenerate result: {0}")]
    DegenerateResult(String),

    /// A fitted artifact was applied against the wrong partition
    #[error("Leakage guard: {0}")]
    LeakageGuard(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Configuration(msg.into())
    }

    pub fn data_quality(column: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::DataQuality {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Column named by a `DataQuality` error, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            PipelineError::DataQuality { column, .. } => Some(column),
            _ => None,
        }
    }
}
