//! # Forecast Math
//!
//! Numerical building blocks for forecast evaluation.
//! This crate provides the accuracy metrics used to score candidate
//! models, descriptive statistics over raw series and the small dense
//! linear algebra the regression-based models need.

use thiserror::Error;

pub mod linalg;
pub mod metrics;
pub mod stats;

pub use metrics::{evaluate, Metrics};

/// Errors that can occur in forecast-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Shape mismatch: actual has {actual} points, predicted has {predicted}")]
    ShapeMismatch { actual: usize, predicted: usize },

    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecast math operations
pub type Result<T> = std::result::Result<T, MathError>;
