//! ARIMA models for time series forecasting

use crate::error::{ForecastError, Result};
use crate::models::{require_len, ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use tracing::debug;

const GRID_STEP: f64 = 0.05;
const GRID_LIMIT: f64 = 0.95;

/// ARIMA model (AutoRegressive Integrated Moving Average).
///
/// AR and MA orders are limited to 0 or 1; the coefficients are chosen by
/// conditional sum of squares over a grid inside the stationary and
/// invertible region.
#[derive(Debug, Clone)]
pub struct Arima {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArima {
    /// Name of the model
    name: String,
    /// Fitted AR coefficient
    phi: f64,
    /// Fitted MA coefficient
    theta: f64,
    /// Constant of the differenced process
    constant: f64,
    /// Last value of the differenced series
    last_diff: f64,
    /// Last in-sample residual
    last_residual: f64,
    /// Last value at each differencing level, level 0 is the raw series
    levels: Vec<f64>,
}

impl Arima {
    /// Create a new ARIMA model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > 1 || q > 1 || d > 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Unsupported ARIMA order ({},{},{}): p and q must be 0 or 1, d at most 2",
                p, d, q
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
        })
    }

    fn grid(order: usize) -> Vec<f64> {
        if order == 0 {
            return vec![0.0];
        }
        let steps = (2.0 * GRID_LIMIT / GRID_STEP).round() as usize;
        (0..=steps)
            .map(|i| -GRID_LIMIT + i as f64 * GRID_STEP)
            .collect()
    }

    fn min_len(&self) -> usize {
        self.d + 3
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self {
            name: "ARIMA(1,1,1)".to_string(),
            p: 1,
            d: 1,
            q: 1,
        }
    }
}

/// Difference a series `order` times
fn difference(data: &[f64], order: usize) -> Vec<f64> {
    let mut current = data.to_vec();
    for _ in 0..order {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    current
}

/// Residuals of an ARMA(1,1) with constant, conditioned on the first point
fn residuals(diffs: &[f64], constant: f64, phi: f64, theta: f64) -> Vec<f64> {
    let mut errors = vec![0.0; diffs.len()];
    for t in 1..diffs.len() {
        errors[t] = diffs[t] - constant - phi * diffs[t - 1] - theta * errors[t - 1];
    }
    errors
}

impl ForecastModel for Arima {
    fn kind(&self) -> ModelKind {
        ModelKind::Arima
    }

    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        require_len(self.kind(), data, self.min_len())?;

        let diffs = difference(data, self.d);
        let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;

        let mut best: Option<(f64, f64, f64)> = None;
        for &phi in &Self::grid(self.p) {
            for &theta in &Self::grid(self.q) {
                let constant = mean * (1.0 - phi);
                let css: f64 = residuals(&diffs, constant, phi, theta)
                    .iter()
                    .map(|e| e * e)
                    .sum();
                if css.is_finite() && best.map_or(true, |(_, _, b)| css < b) {
                    best = Some((phi, theta, css));
                }
            }
        }

        let (phi, theta, css) = best.ok_or_else(|| {
            ForecastError::fit_failed(ModelKind::Arima, "conditional sum of squares diverged")
        })?;
        debug!(model = %self.name, phi, theta, css, "ARIMA coefficients selected");

        let constant = mean * (1.0 - phi);
        let errors = residuals(&diffs, constant, phi, theta);

        let levels = (0..self.d)
            .map(|k| *difference(data, k).last().unwrap_or(&0.0))
            .collect();

        Ok(Box::new(TrainedArima {
            name: self.name.clone(),
            phi,
            theta,
            constant,
            last_diff: diffs.last().copied().unwrap_or(0.0),
            last_residual: errors.last().copied().unwrap_or(0.0),
            levels,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedArima {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let mut levels = self.levels.clone();
        let mut previous = self.last_diff;
        let mut shock = self.last_residual;
        let mut forecasts = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next_diff = self.constant + self.phi * previous + self.theta * shock;
            previous = next_diff;
            shock = 0.0;

            // Undo the differencing from the innermost level outwards
            let mut value = next_diff;
            for level in levels.iter_mut().rev() {
                *level += value;
                value = *level;
            }
            forecasts.push(value);
        }

        ForecastResult::new(forecasts, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_trend_continues() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let trained = Arima::default().train(&data).unwrap();
        let forecast = trained.forecast(3).unwrap();

        assert_eq!(forecast.horizons(), 3);
        for (h, value) in forecast.values().iter().enumerate() {
            let expected = 100.0 + 2.0 * (20 + h) as f64;
            assert!((value - expected).abs() < 1e-6, "step {h}: {value} vs {expected}");
        }
    }

    #[test]
    fn constant_series_stays_flat() {
        let trained = Arima::default().train(&[7.0; 12]).unwrap();
        assert!(trained.forecast(5).unwrap().values().iter().all(|v| (v - 7.0).abs() < 1e-9));
    }

    #[test]
    fn undifferenced_model_reverts_to_mean() {
        let data = [5.0, 15.0, 5.0, 15.0, 5.0, 15.0, 5.0, 15.0];
        let trained = Arima::new(1, 0, 0).unwrap().train(&data).unwrap();
        let forecast = trained.forecast(1).unwrap();
        // Alternating series: strongly negative phi pulls the next value below the mean
        assert!(forecast.values()[0] < 10.0);
    }

    #[test]
    fn test_model_parameter_validation() {
        assert!(Arima::new(2, 1, 1).is_err());
        assert!(Arima::new(1, 3, 1).is_err());
        assert!(Arima::new(0, 1, 0).is_ok());
    }

    #[test]
    fn too_little_data_fails_to_fit() {
        assert!(Arima::default().train(&[1.0, 2.0, 3.0]).is_err());
    }
}
