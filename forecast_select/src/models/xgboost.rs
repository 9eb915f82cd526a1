//! Depth-wise gradient boosting over lag windows, XGBoost regressor defaults

use crate::error::{ForecastError, Result};
use crate::models::boosting::{BoostedEnsemble, BoostingParams, TreeParams};
use crate::models::window::{lag_samples, recursive_forecast};
use crate::models::{require_len, ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};

/// Boosted trees with 50 rounds, eta 0.3, depth 6 and unit L2 penalty
#[derive(Debug, Clone)]
pub struct XgBoost {
    name: String,
    window: usize,
    params: BoostingParams,
}

/// Trained boosted-tree model
#[derive(Debug, Clone)]
pub struct TrainedXgBoost {
    name: String,
    window: usize,
    ensemble: BoostedEnsemble,
    history: Vec<f64>,
}

impl XgBoost {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("XGBoost (window={})", window),
            window: window.max(1),
            params: BoostingParams {
                rounds: 50,
                learning_rate: 0.3,
                tree: TreeParams {
                    max_depth: Some(6),
                    max_leaves: None,
                    min_samples_leaf: 1,
                    lambda: 1.0,
                    min_split_gain: 0.0,
                },
            },
        }
    }
}

impl Default for XgBoost {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ForecastModel for XgBoost {
    fn kind(&self) -> ModelKind {
        ModelKind::Xgboost
    }

    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        require_len(self.kind(), data, self.window + 1)?;

        let (rows, targets) = lag_samples(data, self.window);
        let ensemble = BoostedEnsemble::fit(&rows, &targets, &self.params);

        Ok(Box::new(TrainedXgBoost {
            name: self.name.clone(),
            window: self.window,
            ensemble,
            history: data.to_vec(),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedXgBoost {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if self.history.len() < self.window {
            return Err(ForecastError::fit_failed(
                ModelKind::Xgboost,
                "model has not been fitted to data",
            ));
        }

        let values = recursive_forecast(&self.history, self.window, horizon, |lags| {
            Ok(self.ensemble.predict(lags))
        })?;
        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learns_a_repeating_pattern() {
        let data: Vec<f64> = (0..60).map(|i| [10.0, 20.0, 30.0][i % 3]).collect();
        let trained = XgBoost::default().train(&data).unwrap();
        let forecast = trained.forecast(3).unwrap();

        // Last observed value is 30.0 (index 59), so the cycle restarts at 10.0
        let expected = [10.0, 20.0, 30.0];
        for (got, want) in forecast.values().iter().zip(expected) {
            assert!((got - want).abs() < 1.0, "got {got}, want {want}");
        }
    }

    #[test]
    fn rejects_series_shorter_than_window() {
        let err = XgBoost::default().train(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ModelFitFailed {
                model: ModelKind::Xgboost,
                ..
            }
        ));
    }
}
