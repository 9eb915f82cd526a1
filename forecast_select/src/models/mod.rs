//! Forecasting models behind a uniform train/forecast contract

use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

pub mod arima;
mod boosting;
pub mod lightgbm;
pub mod lstm;
pub mod prophet;
mod window;
pub mod xgboost;

/// Identifier of a model family.
///
/// Declaration order is the tie-break priority used during selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Lstm,
    Xgboost,
    Lightgbm,
    Arima,
    Prophet,
}

impl ModelKind {
    /// Every model family, highest priority first
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Lstm,
        ModelKind::Xgboost,
        ModelKind::Lightgbm,
        ModelKind::Arima,
        ModelKind::Prophet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Lstm => "lstm",
            ModelKind::Xgboost => "xgboost",
            ModelKind::Lightgbm => "lightgbm",
            ModelKind::Arima => "arima",
            ModelKind::Prophet => "prophet",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lstm" => Ok(ModelKind::Lstm),
            "xgboost" | "xgb" => Ok(ModelKind::Xgboost),
            "lightgbm" | "lgbm" => Ok(ModelKind::Lightgbm),
            "arima" | "sarima" => Ok(ModelKind::Arima),
            "prophet" => Ok(ModelKind::Prophet),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown model: {}",
                other
            ))),
        }
    }
}

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ShapeMismatch(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self { values, horizons })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Take ownership of the forecasted values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Whether every forecasted value is a finite number
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Trained forecast model, private to the request that trained it
pub trait TrainedForecastModel: Debug + Send {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a series of observations.
///
/// Implementations hold configuration only; training never mutates the
/// model, so one instance can serve concurrent requests.
pub trait ForecastModel: Debug + Send + Sync {
    /// Which model family this is
    fn kind(&self) -> ModelKind;

    /// Train the model on the given observations
    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Reject training data shorter than `min_len`
pub(crate) fn require_len(kind: ModelKind, data: &[f64], min_len: usize) -> Result<()> {
    if data.len() < min_len {
        return Err(ForecastError::fit_failed(
            kind,
            format!(
                "need at least {} observations, got {}",
                min_len,
                data.len()
            ),
        ));
    }
    Ok(())
}

/// Mapping from model identifier to model
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKind, Arc<dyn ForecastModel>>,
}

impl ModelRegistry {
    /// Registry with no models
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding all five model families configured from `config`
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::empty()
            .with(lstm::Lstm::new(config.window_size, config.seed))
            .with(xgboost::XgBoost::new(config.window_size))
            .with(lightgbm::LightGbm::new(config.window_size))
            .with(arima::Arima::default())
            .with(prophet::Prophet::default())
    }

    /// Add or replace a model, keyed by its kind
    pub fn register(&mut self, model: Arc<dyn ForecastModel>) {
        self.models.insert(model.kind(), model);
    }

    /// Builder-style [`ModelRegistry::register`]
    pub fn with<M: ForecastModel + 'static>(mut self, model: M) -> Self {
        self.register(Arc::new(model));
        self
    }

    pub fn get(&self, kind: ModelKind) -> Option<&Arc<dyn ForecastModel>> {
        self.models.get(&kind)
    }

    pub fn contains(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }

    /// Registered kinds in priority order
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.models.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_and_display() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!("SARIMA".parse::<ModelKind>().unwrap(), ModelKind::Arima);
        assert!("transformer".parse::<ModelKind>().is_err());
    }

    #[test]
    fn ordering_follows_priority() {
        let mut kinds = vec![ModelKind::Prophet, ModelKind::Arima, ModelKind::Lstm];
        kinds.sort();
        assert_eq!(kinds, vec![ModelKind::Lstm, ModelKind::Arima, ModelKind::Prophet]);
    }

    #[test]
    fn default_registry_has_every_family() {
        let registry = ModelRegistry::from_config(&ModelConfig::default());
        assert_eq!(registry.kinds(), ModelKind::ALL.to_vec());
        for kind in ModelKind::ALL {
            assert_eq!(registry.get(kind).map(|m| m.kind()), Some(kind));
        }
    }

    #[test]
    fn forecast_result_checks_length() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());
        let result = ForecastResult::new(vec![1.0, f64::NAN], 2).unwrap();
        assert!(!result.is_finite());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&ModelKind::Lightgbm).unwrap(), "\"lightgbm\"");
    }
}
