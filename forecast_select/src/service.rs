//! Forecasting service: datasets, training jobs and forecasts behind one API

use crate::cancel::CancellationToken;
use crate::config::AppConfig;
use crate::error::{ForecastError, Result};
use crate::jobs::{TrainingJob, TrainingJobManager};
use crate::loader::{parse_upload, UploadFormat};
use crate::models::ModelKind;
use crate::request::ForecastRequest;
use crate::response::ForecastResponse;
use crate::selector::ForecastSelector;
use crate::series::{Series, MIN_SERIES_LEN};
use crate::store::{
    Dataset, DatasetRepository, DatasetStatistics, DatasetSummary, InMemoryDatasetStore,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Where the observations for a call come from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Inline(Vec<f64>),
    Dataset(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Stored only
    Uploaded,
    /// Stored and a training job is running
    Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub dataset_id: Uuid,
    pub filename: String,
    pub records_imported: usize,
    pub uploaded_at: DateTime<Utc>,
    pub training_job_id: Option<Uuid>,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub models_available: BTreeMap<ModelKind, bool>,
    pub auto_selection_enabled: bool,
}

pub struct ForecastService {
    selector: Arc<ForecastSelector>,
    store: Arc<dyn DatasetRepository>,
    jobs: TrainingJobManager,
}

impl ForecastService {
    pub fn new(
        selector: Arc<ForecastSelector>,
        store: Arc<dyn DatasetRepository>,
        jobs: TrainingJobManager,
    ) -> Self {
        Self {
            selector,
            store,
            jobs,
        }
    }

    /// Service with every model family and an in-memory dataset store
    pub fn from_config(config: &AppConfig) -> Self {
        let selector = Arc::new(ForecastSelector::from_config(config.selector.clone()));
        let jobs = TrainingJobManager::new(Arc::clone(&selector), config.jobs.clone());
        Self::new(selector, Arc::new(InMemoryDatasetStore::new()), jobs)
    }

    pub fn selector(&self) -> &ForecastSelector {
        &self.selector
    }

    /// Store an uploaded file; with `auto_train` a training job starts once
    /// the dataset is long enough
    pub fn upload(&self, filename: &str, bytes: &[u8], auto_train: bool) -> Result<UploadReceipt> {
        let format = UploadFormat::from_file_name(filename)?;
        let series = parse_upload(bytes, format)?;
        let dataset = Dataset::new(filename, series.clone());
        let uploaded_at = dataset.uploaded_at;
        let records_imported = dataset.record_count();
        let dataset_id = self.store.save(dataset)?;

        let training_job_id = if auto_train && records_imported >= MIN_SERIES_LEN {
            Some(self.jobs.start(series, Some(dataset_id))?)
        } else {
            None
        };

        info!(dataset = %dataset_id, filename, records_imported, "Dataset uploaded");
        Ok(UploadReceipt {
            dataset_id,
            filename: filename.to_string(),
            records_imported,
            uploaded_at,
            status: if training_job_id.is_some() {
                UploadStatus::Processing
            } else {
                UploadStatus::Uploaded
            },
            training_job_id,
        })
    }

    pub fn forecast(&self, source: DataSource, request: &ForecastRequest) -> Result<ForecastResponse> {
        self.forecast_with_cancel(source, request, &CancellationToken::new())
    }

    pub fn forecast_with_cancel(
        &self,
        source: DataSource,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> Result<ForecastResponse> {
        let series = self.resolve(source)?;
        let outcome = self.selector.run_with_cancel(&series, request, cancel)?;
        Ok(ForecastResponse::from_outcome(&outcome))
    }

    /// Start a training job for inline data or a stored dataset
    pub fn trigger_training(&self, source: DataSource) -> Result<Uuid> {
        let dataset_id = match &source {
            DataSource::Dataset(id) => Some(*id),
            DataSource::Inline(_) => None,
        };
        let series = self.resolve(source)?;
        series.ensure_eligible()?;
        self.jobs.start(series, dataset_id)
    }

    pub fn job_status(&self, id: Uuid) -> Result<TrainingJob> {
        self.jobs.status(id)
    }

    pub fn wait_for_job(&self, id: Uuid, timeout: Duration) -> Result<TrainingJob> {
        self.jobs.wait(id, timeout)
    }

    pub fn cleanup_jobs(&self) -> usize {
        self.jobs.cleanup()
    }

    pub fn datasets(&self) -> Result<Vec<DatasetSummary>> {
        self.store.list()
    }

    pub fn dataset(&self, id: Uuid) -> Result<Dataset> {
        self.store.get(id)
    }

    pub fn delete_dataset(&self, id: Uuid) -> Result<()> {
        self.store.delete(id)
    }

    pub fn statistics(&self) -> Result<DatasetStatistics> {
        self.store.statistics()
    }

    /// Which model families the selector can use
    pub fn model_status(&self) -> ModelStatus {
        let registry = self.selector.registry();
        ModelStatus {
            models_available: ModelKind::ALL
                .iter()
                .map(|&kind| (kind, registry.contains(kind)))
                .collect(),
            auto_selection_enabled: !registry.is_empty(),
        }
    }

    fn resolve(&self, source: DataSource) -> Result<Series> {
        match source {
            DataSource::Inline(values) => {
                if values.is_empty() {
                    return Err(ForecastError::InvalidParameter(
                        "No data provided for forecasting".to_string(),
                    ));
                }
                Series::new(values)
            }
            DataSource::Dataset(id) => Ok(self.store.get(id)?.data),
        }
    }
}
