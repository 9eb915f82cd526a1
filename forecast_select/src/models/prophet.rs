//! Additive trend + seasonality model in the style of Prophet
//!
//! The series is placed on a daily calendar. The trend is piecewise linear
//! with evenly spaced changepoints over the first part of the history; the
//! seasonal terms are Fourier series with weekly and yearly periods, each
//! switched on once the history covers two full cycles. Coefficients are
//! the ridge solution, with penalties inversely proportional to the prior
//! scales.

use crate::error::{ForecastError, Result};
use crate::models::{require_len, ForecastModel, ForecastResult, ModelKind, TrainedForecastModel};
use chrono::{Datelike, NaiveDate};
use forecast_math::linalg::ridge_least_squares;
use std::f64::consts::PI;
use tracing::debug;

/// Days between 0001-01-01 and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const BASE_PENALTY: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Seasonality {
    period: f64,
    order: usize,
}

const WEEKLY: Seasonality = Seasonality {
    period: 7.0,
    order: 3,
};

const YEARLY: Seasonality = Seasonality {
    period: 365.25,
    order: 10,
};

/// Piecewise-linear trend with Fourier seasonality
#[derive(Debug, Clone)]
pub struct Prophet {
    name: String,
    start: NaiveDate,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
}

/// Trained additive model
#[derive(Debug, Clone)]
pub struct TrainedProphet {
    name: String,
    beta: Vec<f64>,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    start_day: i64,
    observations: usize,
    y_scale: f64,
}

impl Prophet {
    /// Model whose first observation falls on `start`
    pub fn starting_at(start: NaiveDate) -> Self {
        Self {
            name: "Prophet".to_string(),
            start,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
        }
    }

    fn changepoints(&self, n: usize) -> Vec<f64> {
        let hist_size = (n as f64 * self.changepoint_range).floor() as usize;
        let count = self.n_changepoints.min(hist_size.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (hist_size - 1) as f64;
        (1..=count)
            .map(|k| (last * k as f64 / count as f64).round() / (n - 1) as f64)
            .collect()
    }
}

impl Default for Prophet {
    fn default() -> Self {
        Self::starting_at(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default())
    }
}

fn days_since_epoch(date: NaiveDate) -> i64 {
    date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE
}

/// One design row: intercept, slope, changepoint hinges, Fourier pairs
fn design_row(t: f64, day: f64, changepoints: &[f64], seasonalities: &[Seasonality]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));

    for season in seasonalities {
        for k in 1..=season.order {
            let angle = 2.0 * PI * k as f64 * day / season.period;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }

    row
}

impl ForecastModel for Prophet {
    fn kind(&self) -> ModelKind {
        ModelKind::Prophet
    }

    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        require_len(self.kind(), data, 3)?;

        let n = data.len();
        let span = (n - 1) as f64;
        let start_day = days_since_epoch(self.start);

        let y_scale = data.iter().map(|v| v.abs()).fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let changepoints = self.changepoints(n);
        let seasonalities: Vec<Seasonality> = [WEEKLY, YEARLY]
            .into_iter()
            .filter(|s| n as f64 >= 2.0 * s.period)
            .collect();

        let design: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                design_row(
                    i as f64 / span,
                    (start_day + i as i64) as f64,
                    &changepoints,
                    &seasonalities,
                )
            })
            .collect();
        let target: Vec<f64> = data.iter().map(|v| v / y_scale).collect();

        let width = design.first().map_or(0, |r| r.len());
        let mut penalties = vec![BASE_PENALTY; width];
        for p in penalties.iter_mut().skip(2).take(changepoints.len()) {
            *p = 0.01 / self.changepoint_prior_scale;
        }
        for p in penalties.iter_mut().skip(2 + changepoints.len()) {
            *p = 0.01 / self.seasonality_prior_scale;
        }

        let beta = ridge_least_squares(&design, &target, &penalties)
            .map_err(|e| ForecastError::fit_failed(ModelKind::Prophet, e.to_string()))?;

        debug!(
            model = %self.name,
            changepoints = changepoints.len(),
            seasonalities = seasonalities.len(),
            "Prophet components fitted"
        );

        Ok(Box::new(TrainedProphet {
            name: self.name.clone(),
            beta,
            changepoints,
            seasonalities,
            start_day,
            observations: n,
            y_scale,
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedProphet {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let span = (self.observations - 1) as f64;
        let values = (self.observations..self.observations + horizon)
            .map(|i| {
                let row = design_row(
                    i as f64 / span,
                    (self.start_day + i as i64) as f64,
                    &self.changepoints,
                    &self.seasonalities,
                );
                row.iter().zip(&self.beta).map(|(x, b)| x * b).sum::<f64>() * self.y_scale
            })
            .collect();

        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
