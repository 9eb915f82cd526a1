//! Leaf-wise gradient boosting over lag windows, LightGBM regression defaults

use crate::error::Result;
use crate::models::boosting::{BoostedEnsemble, BoostingParams, TreeParams};
use crate::models::window::{lag_samples, recursive_forecast};
use crate::models::{require_len, ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};

/// Boosted trees with 50 rounds, learning rate 0.1, 31 leaves and at
/// least 20 samples per leaf.
///
/// On short histories the sample floor blocks every split and the model
/// degrades to the training mean, which is what LightGBM itself does.
#[derive(Debug, Clone)]
pub struct LightGbm {
    name: String,
    window: usize,
    params: BoostingParams,
}

/// Trained leaf-wise boosted model
#[derive(Debug, Clone)]
pub struct TrainedLightGbm {
    name: String,
    window: usize,
    ensemble: BoostedEnsemble,
    history: Vec<f64>,
}

impl LightGbm {
    pub fn new(window: usize) -> Self {
        Self::with_min_samples_leaf(window, 20)
    }

    /// Same defaults with a different per-leaf sample floor
    pub fn with_min_samples_leaf(window: usize, min_samples_leaf: usize) -> Self {
        Self {
            name: format!("LightGBM (window={})", window),
            window: window.max(1),
            params: BoostingParams {
                rounds: 50,
                learning_rate: 0.1,
                tree: TreeParams {
                    max_depth: None,
                    max_leaves: Some(31),
                    min_samples_leaf,
                    lambda: 0.0,
                    min_split_gain: 0.0,
                },
            },
        }
    }
}

impl Default for LightGbm {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ForecastModel for LightGbm {
    fn kind(&self) -> ModelKind {
        ModelKind::Lightgbm
    }

    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        require_len(self.kind(), data, self.window + 1)?;

        let (rows, targets) = lag_samples(data, self.window);
        let ensemble = BoostedEnsemble::fit(&rows, &targets, &self.params);

        Ok(Box::new(TrainedLightGbm {
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

impl TrainedForecastModel for TrainedLightGbm {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = recursive_forecast(&self.history, self.window, horizon, |lags| {
            Ok(self.ensemble.predict(lags))
        })?;
        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
