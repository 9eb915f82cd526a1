//! Accuracy metrics for scoring a predicted series against held-out actuals

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean Absolute Percentage Error, `None` when every actual is zero
    pub mape: Option<f64>,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl Metrics {
    /// Whether these metrics can take part in model selection
    pub fn is_selectable(&self) -> bool {
        matches!(self.mape, Some(m) if m.is_finite()) && self.rmse.is_finite()
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE: {:.4}%", mape)?,
            None => writeln!(f, "  MAPE: undefined")?,
        }
        writeln!(f, "  RMSE: {:.4}", self.rmse)?;
        writeln!(f, "  MAE:  {:.4}", self.mae)?;
        writeln!(f, "  R2:   {:.4}", self.r2)?;
        Ok(())
    }
}

/// Evaluate a predicted series against the actual values.
///
/// Both slices must be non-empty and of equal length.
///
/// # Examples
///
/// ```
/// use forecast_math::evaluate;
///
/// let metrics = evaluate(&[10.0, 20.0], &[10.0, 20.0]).unwrap();
/// assert_eq!(metrics.mape, Some(0.0));
/// assert_eq!(metrics.rmse, 0.0);
/// ```
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(MathError::ShapeMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }

    Ok(Metrics {
        mape: mean_absolute_percentage_error(actual, predicted),
        rmse: root_mean_squared_error(actual, predicted),
        mae: mean_absolute_error(actual, predicted),
        r2: r_squared(actual, predicted),
    })
}

/// MAPE in percent over the points whose actual value is non-zero.
///
/// Zero actuals are left out of the average; if no point remains the
/// metric is undefined.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (&a, &p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64 * 100.0)
    }
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_squared_error(actual, predicted).sqrt()
}

/// Mean squared error
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination, 0 when the actual series is constant
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        let metrics = evaluate(&actual, &predicted).unwrap();
        assert_relative_eq!(metrics.mae, 2.4, epsilon = 1e-12);
        assert_relative_eq!(metrics.rmse, (30.0_f64 / 5.0).sqrt(), epsilon = 1e-12);
        // 20% + 10% + 10% + 7.5% + 4% averaged
        assert_relative_eq!(metrics.mape.unwrap(), 10.3, epsilon = 1e-9);
        assert_relative_eq!(metrics.r2, 1.0 - 30.0 / 1000.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_actuals_are_left_out_of_mape() {
        let mape = mean_absolute_percentage_error(&[0.0, 10.0], &[5.0, 11.0]).unwrap();
        assert_relative_eq!(mape, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn mape_is_undefined_when_every_actual_is_zero() {
        let metrics = evaluate(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert_eq!(metrics.mape, None);
        assert!(!metrics.is_selectable());
    }

    #[test]
    fn constant_actuals_give_zero_r2() {
        assert_eq!(r_squared(&[5.0, 5.0, 5.0], &[4.0, 6.0, 5.0]), 0.0);
    }

    #[test]
    fn test_error_handling() {
        assert_eq!(
            evaluate(&[1.0, 2.0, 3.0], &[1.0, 2.0]),
            Err(MathError::ShapeMismatch {
                actual: 3,
                predicted: 2
            })
        );
        assert!(evaluate(&[], &[]).is_err());
    }
}
