//! Packaging of a selection outcome into the forecast response payload

use crate::confidence::ConfidenceBounds;
use crate::models::ModelKind;
use crate::outcome::SelectionOutcome;
use chrono::{DateTime, Utc};
use forecast_math::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Response returned to forecast callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast_id: Uuid,
    pub model_used: ModelKind,
    pub predictions: Vec<f64>,
    pub confidence_intervals: ConfidenceBounds,
    /// Validation metrics of the chosen model, absent when it was not scored
    pub metrics: Option<Metrics>,
    /// Validation metrics of every scored candidate
    pub all_model_results: BTreeMap<ModelKind, Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_breakdown: Option<BTreeMap<ModelKind, Vec<f64>>>,
    pub created_at: DateTime<Utc>,
}

impl ForecastResponse {
    /// Build the response for `outcome` with a fresh id and timestamp
    pub fn from_outcome(outcome: &SelectionOutcome) -> Self {
        let all_model_results = outcome
            .results()
            .iter()
            .filter_map(|r| r.metrics.map(|m| (r.model, m)))
            .collect();

        Self {
            forecast_id: Uuid::new_v4(),
            model_used: outcome.model_used(),
            predictions: outcome.predictions().to_vec(),
            confidence_intervals: outcome.bounds().clone(),
            metrics: outcome.metrics().copied(),
            all_model_results,
            model_breakdown: outcome.model_breakdown().cloned(),
            created_at: Utc::now(),
        }
    }
}

impl From<SelectionOutcome> for ForecastResponse {
    fn from(outcome: SelectionOutcome) -> Self {
        Self::from_outcome(&outcome)
    }
}
