//! Per-model results and the outcome of a selection run

use crate::confidence::{ConfidenceBounds, ConfidenceLevel};
use crate::models::ModelKind;
use forecast_math::Metrics;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Validation result of one candidate that fitted and predicted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: ModelKind,
    /// Predictions over the validation split
    pub predictions: Vec<f64>,
    /// Absent when there was no validation split to score against
    pub metrics: Option<Metrics>,
    /// True iff the candidate was scored
    pub success: bool,
}

impl ModelResult {
    pub fn scored(model: ModelKind, predictions: Vec<f64>, metrics: Metrics) -> Self {
        Self {
            model,
            predictions,
            metrics: Some(metrics),
            success: true,
        }
    }

    pub fn unscored(model: ModelKind) -> Self {
        Self {
            model,
            predictions: Vec::new(),
            metrics: None,
            success: false,
        }
    }

    /// Whether this result can win selection
    pub fn is_selectable(&self) -> bool {
        self.success && self.metrics.map_or(false, |m| m.is_selectable())
    }
}

/// A candidate that could not be fitted or could not predict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub model: ModelKind,
    pub reason: String,
}

/// Lowest MAPE, then lowest RMSE, then model priority
pub(crate) fn compare_candidates(a: &ModelResult, b: &ModelResult) -> Ordering {
    let key = |r: &ModelResult| {
        r.metrics
            .map(|m| (m.mape.unwrap_or(f64::INFINITY), m.rmse))
            .unwrap_or((f64::INFINITY, f64::INFINITY))
    };
    let (mape_a, rmse_a) = key(a);
    let (mape_b, rmse_b) = key(b);

    mape_a
        .total_cmp(&mape_b)
        .then(rmse_a.total_cmp(&rmse_b))
        .then(a.model.cmp(&b.model))
}

/// Selectable results, best first
pub(crate) fn rank(results: &[ModelResult]) -> Vec<&ModelResult> {
    let mut ranked: Vec<&ModelResult> = results.iter().filter(|r| r.is_selectable()).collect();
    ranked.sort_by(|a, b| compare_candidates(a, b));
    ranked
}

/// Scores of every candidate without a final forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub results: Vec<ModelResult>,
    pub failures: Vec<ModelFailure>,
    /// Winner by MAPE, if any candidate was selectable
    pub best: Option<ModelKind>,
}

impl Evaluation {
    pub fn best_result(&self) -> Option<&ModelResult> {
        let best = self.best?;
        self.results.iter().find(|r| r.model == best)
    }
}

/// Everything a forecast request produced
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    results: Vec<ModelResult>,
    failures: Vec<ModelFailure>,
    model_used: ModelKind,
    metrics: Option<Metrics>,
    predictions: Vec<f64>,
    bounds: ConfidenceBounds,
    confidence_level: ConfidenceLevel,
    model_breakdown: Option<BTreeMap<ModelKind, Vec<f64>>>,
}

impl SelectionOutcome {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        results: Vec<ModelResult>,
        failures: Vec<ModelFailure>,
        model_used: ModelKind,
        metrics: Option<Metrics>,
        predictions: Vec<f64>,
        bounds: ConfidenceBounds,
        confidence_level: ConfidenceLevel,
        model_breakdown: Option<BTreeMap<ModelKind, Vec<f64>>>,
    ) -> Self {
        Self {
            results,
            failures,
            model_used,
            metrics,
            predictions,
            bounds,
            confidence_level,
            model_breakdown,
        }
    }

    pub fn results(&self) -> &[ModelResult] {
        &self.results
    }

    pub fn failures(&self) -> &[ModelFailure] {
        &self.failures
    }

    pub fn model_used(&self) -> ModelKind {
        self.model_used
    }

    /// Validation metrics of the chosen model
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    pub fn predictions(&self) -> &[f64] {
        &self.predictions
    }

    pub fn bounds(&self) -> &ConfidenceBounds {
        &self.bounds
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    /// Full-horizon forecast of every refitted candidate
    pub fn model_breakdown(&self) -> Option<&BTreeMap<ModelKind, Vec<f64>>> {
        self.model_breakdown.as_ref()
    }
}
