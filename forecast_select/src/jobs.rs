//! Background training jobs
//!
//! A job scores every model on a series on its own thread and records the
//! outcome. Callers poll [`TrainingJobManager::status`] or block in
//! [`TrainingJobManager::wait`].

use crate::config::JobConfig;
use crate::error::{ForecastError, Result};
use crate::models::ModelKind;
use crate::outcome::{Evaluation, ModelFailure};
use crate::selector::ForecastSelector;
use crate::series::Series;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use forecast_math::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// What a completed job found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub data_points: usize,
    pub best_model: Option<ModelKind>,
    pub best_metrics: Option<Metrics>,
    pub model_results: BTreeMap<ModelKind, Metrics>,
    pub failures: Vec<ModelFailure>,
}

impl TrainingReport {
    fn from_evaluation(evaluation: &Evaluation, data_points: usize) -> Self {
        Self {
            data_points,
            best_model: evaluation.best,
            best_metrics: evaluation.best_result().and_then(|r| r.metrics),
            model_results: evaluation
                .results
                .iter()
                .filter_map(|r| r.metrics.map(|m| (r.model, m)))
                .collect(),
            failures: evaluation.failures.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: Uuid,
    pub dataset_id: Option<Uuid>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<TrainingReport>,
    pub error: Option<String>,
}

impl TrainingJob {
    fn pending(dataset_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            dataset_id,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

#[derive(Debug, Default)]
struct JobBoard {
    jobs: Mutex<HashMap<Uuid, TrainingJob>>,
    changed: Condvar,
}

impl JobBoard {
    fn update<F: FnOnce(&mut TrainingJob)>(&self, id: Uuid, apply: F) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.get_mut(&id) {
            apply(job);
        }
        self.changed.notify_all();
    }
}

/// Runs training jobs and keeps their state
#[derive(Debug, Clone)]
pub struct TrainingJobManager {
    board: Arc<JobBoard>,
    selector: Arc<ForecastSelector>,
    config: JobConfig,
}

impl TrainingJobManager {
    pub fn new(selector: Arc<ForecastSelector>, config: JobConfig) -> Self {
        Self {
            board: Arc::new(JobBoard::default()),
            selector,
            config,
        }
    }

    /// Queue a job for `series` and start it on a new thread
    pub fn start(&self, series: Series, dataset_id: Option<Uuid>) -> Result<Uuid> {
        let job = TrainingJob::pending(dataset_id);
        let id = job.id;
        self.board
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, job);

        let board = Arc::clone(&self.board);
        let selector = Arc::clone(&self.selector);
        let spawned = thread::Builder::new()
            .name(format!("training-{}", id))
            .spawn(move || run_job(&board, &selector, id, &series));

        if let Err(err) = spawned {
            self.board.update(id, |job| {
                job.status = JobStatus::Failed;
                job.completed_at = Some(Utc::now());
                job.error = Some(err.to_string());
            });
            return Err(err.into());
        }

        info!(job = %id, dataset = ?dataset_id, "Training job started");
        Ok(id)
    }

    pub fn status(&self, id: Uuid) -> Result<TrainingJob> {
        self.board
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| ForecastError::NotFound(format!("training job {}", id)))
    }

    /// Block until the job finishes or `timeout` passes, then return its state
    pub fn wait(&self, id: Uuid, timeout: Duration) -> Result<TrainingJob> {
        let deadline = Instant::now() + timeout;
        let mut jobs = self.board.jobs.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let job = jobs
                .get(&id)
                .ok_or_else(|| ForecastError::NotFound(format!("training job {}", id)))?;
            let now = Instant::now();
            if job.status.is_finished() || now >= deadline {
                return Ok(job.clone());
            }

            let (guard, _) = self
                .board
                .changed
                .wait_timeout(jobs, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            jobs = guard;
        }
    }

    /// All jobs, newest first
    pub fn list(&self) -> Vec<TrainingJob> {
        let jobs = self.board.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<TrainingJob> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Drop finished jobs older than the configured age
    pub fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - ChronoDuration::hours(self.config.max_age_hours);
        self.cleanup_finished_before(cutoff)
    }

    /// Drop finished jobs that completed before `cutoff`
    pub fn cleanup_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.board.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, job| {
            !(job.status.is_finished() && job.completed_at.map_or(false, |at| at < cutoff))
        });
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed, "Old training jobs removed");
        }
        removed
    }
}

fn run_job(board: &JobBoard, selector: &ForecastSelector, id: Uuid, series: &Series) {
    board.update(id, |job| {
        job.status = JobStatus::Processing;
        job.started_at = Some(Utc::now());
    });

    let outcome = selector.evaluate(series).and_then(|evaluation| {
        if evaluation.best.is_none() {
            let reasons: Vec<String> = evaluation
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.model, f.reason))
                .collect();
            return Err(ForecastError::NoModelAvailable(reasons.join("; ")));
        }
        Ok(TrainingReport::from_evaluation(&evaluation, series.len()))
    });

    board.update(id, |job| {
        job.completed_at = Some(Utc::now());
        match outcome {
            Ok(report) => {
                info!(job = %id, best = ?report.best_model, "Training job completed");
                job.status = JobStatus::Completed;
                job.result = Some(report);
            }
            Err(err) => {
                error!(job = %id, error = %err, "Training job failed");
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
            }
        }
    });
}
