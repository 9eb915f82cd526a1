//! Error types for the forecast_select crate

use crate::models::ModelKind;
use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the forecast_select crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Series shorter than the minimum eligible length
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Series contains values no model can use
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// Actual and predicted lengths disagree during evaluation
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A model could not be fitted or could not predict
    #[error("Model {model} failed to fit: {reason}")]
    ModelFitFailed { model: ModelKind, reason: String },

    /// Auto mode ended with no usable candidate
    #[error("No model available: {0}")]
    NoModelAvailable(String),

    /// Error from invalid request or configuration parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller abandoned the request
    #[error("Forecast request cancelled")]
    Cancelled,

    /// Error related to parsing uploaded data
    #[error("Data error: {0}")]
    DataError(String),

    /// Unknown dataset or job
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    MathError(MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON parsing
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ForecastError {
    pub(crate) fn fit_failed(model: ModelKind, reason: impl Into<String>) -> Self {
        ForecastError::ModelFitFailed {
            model,
            reason: reason.into(),
        }
    }

    /// Whether the error is caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData(_)
                | ForecastError::InvalidSeries(_)
                | ForecastError::InvalidParameter(_)
                | ForecastError::DataError(_)
                | ForecastError::NotFound(_)
                | ForecastError::CsvError(_)
                | ForecastError::JsonError(_)
        )
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::ShapeMismatch { .. } => ForecastError::ShapeMismatch(err.to_string()),
            other => ForecastError::MathError(other),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
