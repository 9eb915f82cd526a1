//! Uploaded datasets and the repository that holds them

use crate::error::{ForecastError, Result};
use crate::series::Series;
use chrono::{DateTime, Utc};
use forecast_math::stats::{summarize, Summary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// A named series uploaded by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub data: Series,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, data: Series) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data,
            uploaded_at: Utc::now(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.data.len()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            name: self.name.clone(),
            record_count: self.record_count(),
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Listing entry without the observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub name: String,
    pub record_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Aggregate figures over every stored observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub total_datasets: usize,
    pub total_records: usize,
    /// `None` when no observation is stored
    pub values: Option<Summary>,
}

/// Storage of uploaded datasets
pub trait DatasetRepository: Send + Sync {
    /// Store a dataset, replacing one with the same id
    fn save(&self, dataset: Dataset) -> Result<Uuid>;

    fn get(&self, id: Uuid) -> Result<Dataset>;

    /// Summaries, oldest upload first
    fn list(&self) -> Result<Vec<DatasetSummary>>;

    fn delete(&self, id: Uuid) -> Result<()>;

    fn statistics(&self) -> Result<DatasetStatistics>;
}

/// Process-local repository; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct InMemoryDatasetStore {
    datasets: RwLock<HashMap<Uuid, Dataset>>,
}

impl InMemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> ForecastError {
    ForecastError::NotFound(format!("dataset {}", id))
}

impl DatasetRepository for InMemoryDatasetStore {
    fn save(&self, dataset: Dataset) -> Result<Uuid> {
        let id = dataset.id;
        self.datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, dataset);
        Ok(id)
    }

    fn get(&self, id: Uuid) -> Result<Dataset> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn list(&self) -> Result<Vec<DatasetSummary>> {
        let datasets = self.datasets.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<DatasetSummary> = datasets.values().map(Dataset::summary).collect();
        summaries.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then_with(|| a.name.cmp(&b.name)));
        Ok(summaries)
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        self.datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    fn statistics(&self) -> Result<DatasetStatistics> {
        let datasets = self.datasets.read().unwrap_or_else(PoisonError::into_inner);
        let all_values: Vec<f64> = datasets
            .values()
            .flat_map(|d| d.data.values().iter().copied())
            .collect();

        let values = if all_values.is_empty() {
            None
        } else {
            Some(summarize(&all_values)?)
        };

        Ok(DatasetStatistics {
            total_datasets: datasets.len(),
            total_records: all_values.len(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dataset(name: &str, values: Vec<f64>) -> Dataset {
        Dataset::new(name, Series::new(values).unwrap())
    }

    #[test]
    fn save_get_delete() {
        let store = InMemoryDatasetStore::new();
        let id = store.save(dataset("sales.csv", vec![1.0, 2.0])).unwrap();

        assert_eq!(store.get(id).unwrap().record_count(), 2);
        store.delete(id).unwrap();
        assert!(matches!(store.get(id), Err(ForecastError::NotFound(_))));
        assert!(matches!(store.delete(id), Err(ForecastError::NotFound(_))));
    }

    #[test]
    fn statistics_cover_every_dataset() {
        let store = InMemoryDatasetStore::new();
        assert_eq!(store.statistics().unwrap().values, None);

        store.save(dataset("a", vec![1.0, 3.0])).unwrap();
        store.save(dataset("b", vec![5.0, 7.0])).unwrap();

        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_datasets, 2);
        assert_eq!(stats.total_records, 4);
        let values = stats.values.unwrap();
        assert_relative_eq!(values.mean, 4.0);
        assert_relative_eq!(values.min, 1.0);
        assert_relative_eq!(values.max, 7.0);
        assert_relative_eq!(values.std, 5.0_f64.sqrt());
    }
}
