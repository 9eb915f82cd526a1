//! Automatic model selection: fit every candidate on the training split,
//! score it on the validation split, refit the winner on the full series
//! and bound its forecast.

use crate::cancel::CancellationToken;
use crate::config::SelectorConfig;
use crate::confidence::{ConfidenceBounds, ConfidenceLevel};
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ModelKind, ModelRegistry};
use crate::outcome::{rank, Evaluation, ModelFailure, ModelResult, SelectionOutcome};
use crate::request::{ForecastRequest, ModelChoice};
use crate::series::{Series, Split};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one candidate during the fan-out
enum Attempt {
    Scored(ModelResult),
    Failed(ModelFailure),
    Skipped,
}

/// Runs the selection protocol over a [`ModelRegistry`]
#[derive(Debug, Clone)]
pub struct ForecastSelector {
    registry: ModelRegistry,
    config: SelectorConfig,
}

impl ForecastSelector {
    pub fn new(registry: ModelRegistry, config: SelectorConfig) -> Self {
        Self { registry, config }
    }

    /// Selector over all five model families
    pub fn from_config(config: SelectorConfig) -> Self {
        let registry = ModelRegistry::from_config(&config.models);
        Self::new(registry, config)
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Produce a bounded forecast for `series`
    pub fn run(&self, series: &Series, request: &ForecastRequest) -> Result<SelectionOutcome> {
        self.run_with_cancel(series, request, &CancellationToken::new())
    }

    /// [`ForecastSelector::run`], abandoning work once `cancel` fires
    pub fn run_with_cancel(
        &self,
        series: &Series,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> Result<SelectionOutcome> {
        series.ensure_eligible()?;
        self.check_horizon(request.horizon)?;
        let level = ConfidenceLevel::try_from(request.confidence_level)?;

        let candidates = self.candidates(request.model)?;
        let split = series.split(self.config.train_fraction);
        info!(
            observations = series.len(),
            training = split.training.len(),
            validation = split.validation.len(),
            candidates = candidates.len(),
            model = %request.model,
            "Starting forecast selection"
        );

        let (results, mut failures) = self.fan_out(&candidates, &split, cancel)?;

        let order: Vec<&ModelResult> = match request.model {
            ModelChoice::Pinned(kind) => {
                if let Some(failure) = failures.iter().find(|f| f.model == kind) {
                    return Err(ForecastError::fit_failed(kind, failure.reason.clone()));
                }
                results.iter().filter(|r| r.model == kind).collect()
            }
            ModelChoice::Auto => rank(&results),
        };

        if order.is_empty() {
            return Err(ForecastError::NoModelAvailable(describe_failures(&failures)));
        }

        let (breakdown, mut refit_errors) = if self.config.refit_all {
            let (map, errors) = self.refit_many(&order, series, request.horizon, cancel)?;
            (Some(map), errors)
        } else {
            (None, BTreeMap::new())
        };

        let mut chosen: Option<(&ModelResult, Vec<f64>)> = None;
        for candidate in &order {
            let refit = match &breakdown {
                Some(map) => match map.get(&candidate.model) {
                    Some(predictions) => Ok(predictions.clone()),
                    None => Err(refit_errors.remove(&candidate.model).unwrap_or_else(|| {
                        ForecastError::fit_failed(candidate.model, "no refit produced")
                    })),
                },
                None => {
                    if cancel.is_cancelled() {
                        return Err(ForecastError::Cancelled);
                    }
                    self.refit(candidate.model, series, request.horizon)
                }
            };

            match refit {
                Ok(predictions) => {
                    chosen = Some((*candidate, predictions));
                    break;
                }
                Err(err) => {
                    if let ModelChoice::Pinned(_) = request.model {
                        return Err(err);
                    }
                    warn!(model = %candidate.model, error = %err, "Refit failed, trying next candidate");
                    failures.push(ModelFailure {
                        model: candidate.model,
                        reason: err.to_string(),
                    });
                }
            }
        }

        // Runners-up whose refit failed after the winner was found
        failures.extend(refit_errors.into_iter().map(|(model, err)| ModelFailure {
            model,
            reason: err.to_string(),
        }));

        let (winner, predictions) = chosen
            .ok_or_else(|| ForecastError::NoModelAvailable(describe_failures(&failures)))?;
        let metrics = winner.metrics;
        let bounds = ConfidenceBounds::around(&predictions, metrics.map(|m| m.rmse), level)?;
        let model_used = winner.model;

        info!(
            model = %model_used,
            mape = ?metrics.and_then(|m| m.mape),
            horizon = request.horizon,
            "Forecast model selected"
        );

        Ok(SelectionOutcome::new(
            results,
            failures,
            model_used,
            metrics,
            predictions,
            bounds,
            level,
            breakdown,
        ))
    }

    /// Score every registered model without producing a forecast
    pub fn evaluate(&self, series: &Series) -> Result<Evaluation> {
        self.evaluate_with_cancel(series, &CancellationToken::new())
    }

    pub fn evaluate_with_cancel(
        &self,
        series: &Series,
        cancel: &CancellationToken,
    ) -> Result<Evaluation> {
        series.ensure_eligible()?;
        let candidates = self.candidates(ModelChoice::Auto)?;
        let split = series.split(self.config.train_fraction);

        let (results, failures) = self.fan_out(&candidates, &split, cancel)?;
        let best = rank(&results).first().map(|r| r.model);
        info!(best = ?best, scored = results.len(), failed = failures.len(), "Evaluation finished");

        Ok(Evaluation {
            results,
            failures,
            best,
        })
    }

    fn check_horizon(&self, horizon: usize) -> Result<()> {
        if horizon == 0 || horizon > self.config.max_horizon {
            return Err(ForecastError::InvalidParameter(format!(
                "horizon must be between 1 and {}, got {}",
                self.config.max_horizon, horizon
            )));
        }
        Ok(())
    }

    fn candidates(&self, choice: ModelChoice) -> Result<Vec<Arc<dyn ForecastModel>>> {
        match choice {
            ModelChoice::Auto => Ok(self
                .registry
                .kinds()
                .into_iter()
                .filter_map(|kind| self.registry.get(kind).cloned())
                .collect()),
            ModelChoice::Pinned(kind) => self
                .registry
                .get(kind)
                .cloned()
                .map(|model| vec![model])
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!("model {} is not registered", kind))
                }),
        }
    }

    /// Fit and score each candidate; fitting failures are kept apart
    fn fan_out(
        &self,
        candidates: &[Arc<dyn ForecastModel>],
        split: &Split<'_>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<ModelResult>, Vec<ModelFailure>)> {
        let attempt = |model: &Arc<dyn ForecastModel>| {
            if cancel.is_cancelled() {
                return Attempt::Skipped;
            }
            match score(model.as_ref(), split) {
                Ok(result) => {
                    debug!(model = %result.model, metrics = ?result.metrics, "Candidate scored");
                    Attempt::Scored(result)
                }
                Err(err) => {
                    warn!(model = %model.kind(), error = %err, "Candidate failed");
                    Attempt::Failed(ModelFailure {
                        model: model.kind(),
                        reason: failure_reason(&err),
                    })
                }
            }
        };

        let attempts: Vec<Attempt> = if self.config.parallel {
            candidates.par_iter().map(attempt).collect()
        } else {
            candidates.iter().map(attempt).collect()
        };

        if cancel.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for attempt in attempts {
            match attempt {
                Attempt::Scored(result) => results.push(result),
                Attempt::Failed(failure) => failures.push(failure),
                Attempt::Skipped => {}
            }
        }
        Ok((results, failures))
    }

    /// Train on the full series and forecast `horizon` steps
    fn refit(&self, kind: ModelKind, series: &Series, horizon: usize) -> Result<Vec<f64>> {
        let model = self
            .registry
            .get(kind)
            .ok_or_else(|| ForecastError::fit_failed(kind, "model is not registered"))?;
        let forecast = model.train(series.values())?.forecast(horizon)?;
        if !forecast.is_finite() {
            return Err(ForecastError::fit_failed(kind, "forecast contains non-finite values"));
        }
        Ok(forecast.into_values())
    }

    /// Refit every candidate in `order`, splitting forecasts from refit errors
    fn refit_many(
        &self,
        order: &[&ModelResult],
        series: &Series,
        horizon: usize,
        cancel: &CancellationToken,
    ) -> Result<(BTreeMap<ModelKind, Vec<f64>>, BTreeMap<ModelKind, ForecastError>)> {
        let kinds: Vec<ModelKind> = order.iter().map(|r| r.model).collect();
        let refit_one = |kind: &ModelKind| {
            if cancel.is_cancelled() {
                return (*kind, Err(ForecastError::Cancelled));
            }
            (*kind, self.refit(*kind, series, horizon))
        };

        let refits: Vec<(ModelKind, Result<Vec<f64>>)> = if self.config.parallel {
            kinds.par_iter().map(refit_one).collect()
        } else {
            kinds.iter().map(refit_one).collect()
        };

        if cancel.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        let mut breakdown = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (kind, refit) in refits {
            match refit {
                Ok(predictions) => {
                    breakdown.insert(kind, predictions);
                }
                Err(err) => {
                    warn!(model = %kind, error = %err, "Refit failed");
                    errors.insert(kind, err);
                }
            }
        }
        Ok((breakdown, errors))
    }
}

/// Fit on the training split and score on the validation split
fn score(model: &dyn ForecastModel, split: &Split<'_>) -> Result<ModelResult> {
    let kind = model.kind();
    if !split.has_validation() {
        return Ok(ModelResult::unscored(kind));
    }

    let trained = model.train(split.training)?;
    let forecast = trained.forecast(split.validation.len())?;
    if !forecast.is_finite() {
        return Err(ForecastError::fit_failed(kind, "forecast contains non-finite values"));
    }

    let metrics = forecast_math::evaluate(split.validation, forecast.values())?;
    Ok(ModelResult::scored(kind, forecast.into_values(), metrics))
}

fn failure_reason(err: &ForecastError) -> String {
    match err {
        ForecastError::ModelFitFailed { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

fn describe_failures(failures: &[ModelFailure]) -> String {
    if failures.is_empty() {
        return "no candidate could be scored on the validation split".to_string();
    }
    let details: Vec<String> = failures
        .iter()
        .map(|f| format!("{}: {}", f.model, f.reason))
        .collect();
    format!("every candidate failed ({})", details.join("; "))
}
