//! Confidence levels and the heuristic bounds derived from validation RMSE

use crate::error::{ForecastError, Result};
use forecast_math::stats::two_sided_z;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported two-sided confidence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    Ninety,
    NinetyFive,
    NinetyNine,
}

impl ConfidenceLevel {
    pub fn as_f64(&self) -> f64 {
        match self {
            ConfidenceLevel::Ninety => 0.90,
            ConfidenceLevel::NinetyFive => 0.95,
            ConfidenceLevel::NinetyNine => 0.99,
        }
    }

    /// Standard normal quantile for this level: 1.645, 1.960 or 2.576
    pub fn z_score(&self) -> Result<f64> {
        Ok(two_sided_z(self.as_f64())?)
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::NinetyFive
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = ForecastError;

    fn try_from(level: f64) -> Result<Self> {
        [
            ConfidenceLevel::Ninety,
            ConfidenceLevel::NinetyFive,
            ConfidenceLevel::NinetyNine,
        ]
        .into_iter()
        .find(|candidate| (candidate.as_f64() - level).abs() < 1e-9)
        .ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "confidence level must be 0.90, 0.95 or 0.99, got {}",
                level
            ))
        })
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

/// Lower and upper band around a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ConfidenceBounds {
    /// `prediction ∓ z * rmse`; without an RMSE the band has zero width
    pub fn around(predictions: &[f64], rmse: Option<f64>, level: ConfidenceLevel) -> Result<Self> {
        let half_width = match rmse {
            Some(rmse) => level.z_score()? * rmse,
            None => 0.0,
        };

        Ok(Self {
            lower: predictions.iter().map(|p| p - half_width).collect(),
            upper: predictions.iter().map(|p| p + half_width).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}
