//! Descriptive statistics and normal quantiles

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// Summary of a set of observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

/// Summarise a non-empty slice of observations
pub fn summarize(values: &[f64]) -> Result<Summary> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot summarise an empty series".to_string(),
        ));
    }

    Ok(Summary {
        count: values.len(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        mean: Statistics::mean(values.iter()),
        std: Statistics::population_std_dev(values.iter()),
    })
}

/// Two-sided standard normal critical value for a confidence level in (0, 1).
///
/// # Examples
///
/// ```
/// let z = forecast_math::stats::two_sided_z(0.95).unwrap();
/// assert!((z - 1.96).abs() < 1e-3);
/// ```
pub fn two_sided_z(confidence_level: f64) -> Result<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must be between 0 and 1, got {confidence_level}"
        )));
    }

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn summary_of_small_series() {
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(summary.count, 8);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_abs_diff_eq!(summary.mean, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.std, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_series_has_no_summary() {
        assert!(summarize(&[]).is_err());
    }

    #[test]
    fn z_scores_match_the_usual_table() {
        assert_abs_diff_eq!(two_sided_z(0.90).unwrap(), 1.645, epsilon = 1e-3);
        assert_abs_diff_eq!(two_sided_z(0.95).unwrap(), 1.960, epsilon = 1e-3);
        assert_abs_diff_eq!(two_sided_z(0.99).unwrap(), 2.576, epsilon = 1e-3);
    }

    #[test]
    fn z_rejects_out_of_range_levels() {
        assert!(two_sided_z(0.0).is_err());
        assert!(two_sided_z(1.0).is_err());
        assert!(two_sided_z(f64::NAN).is_err());
    }
}
