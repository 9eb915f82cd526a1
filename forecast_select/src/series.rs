//! Observation series and the train/validation split

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Minimum number of observations a series needs to be forecast
pub const MIN_SERIES_LEN: usize = 10;

/// Ordered numeric observations, insertion order is time order.
///
/// Every value is finite; construction rejects NaN and infinities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Series {
    values: Vec<f64>,
}

impl Series {
    /// Create a series from cleaned observations
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries(format!(
                "Value at position {} is not a finite number",
                index
            )));
        }
        Ok(Self { values })
    }

    /// Get the observations
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the series is long enough to be forecast
    pub fn ensure_eligible(&self) -> Result<()> {
        if self.values.len() < MIN_SERIES_LEN {
            return Err(ForecastError::InsufficientData(format!(
                "Insufficient data for forecasting (minimum {} points required, got {})",
                MIN_SERIES_LEN,
                self.values.len()
            )));
        }
        Ok(())
    }

    /// Split into a leading training part and a trailing validation part.
    ///
    /// The training part holds `floor(len * train_fraction)` points. When
    /// no validation point remains the whole series is training data and
    /// [`Split::has_validation`] is false.
    pub fn split(&self, train_fraction: f64) -> Split<'_> {
        let fraction = train_fraction.clamp(0.0, 1.0);
        // Nudge before flooring so that e.g. 10 * 0.8 is 8 and not 7.
        let train_len = ((self.values.len() as f64 * fraction) + 1e-9).floor() as usize;
        let train_len = train_len.min(self.values.len());

        if train_len == self.values.len() {
            return Split {
                training: &self.values,
                validation: &[],
            };
        }

        let (training, validation) = self.values.split_at(train_len);
        Split {
            training,
            validation,
        }
    }
}

impl TryFrom<Vec<f64>> for Series {
    type Error = ForecastError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Series::new(values)
    }
}

impl From<Series> for Vec<f64> {
    fn from(series: Series) -> Self {
        series.values
    }
}

/// Contiguous training/validation partition of a [`Series`]
#[derive(Debug, Clone, Copy)]
pub struct Split<'a> {
    pub training: &'a [f64],
    pub validation: &'a [f64],
}

impl Split<'_> {
    /// Whether candidates can be scored on this split
    pub fn has_validation(&self) -> bool {
        !self.validation.is_empty()
    }
}
