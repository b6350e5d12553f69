//! In-process dataset store used for dry runs and tests

use crate::dataset::Dataset;
use crate::error::{PublishError, Result};
use crate::hdx::repository::{DatasetRepository, RunStamp, UpsertAction, UpsertOutcome};
use crate::hdx::types::{RemoteDataset, RemoteResource};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// A dataset held by [`InMemoryRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDataset {
    pub remote: RemoteDataset,
    pub title: String,
    pub dataset_date: String,
    pub batch: Uuid,
}

#[derive(Debug, Default)]
struct MemoryState {
    datasets: BTreeMap<String, StoredDataset>,
    creates: usize,
    updates: usize,
}

/// [`DatasetRepository`] that keeps everything in memory.
///
/// Mirrors HDX in rejecting a create for a name that is already taken.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored dataset by name
    pub fn get(&self, name: &str) -> Option<StoredDataset> {
        self.lock().datasets.get(name).cloned()
    }

    /// Number of datasets stored
    pub fn len(&self) -> usize {
        self.lock().datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the map half-written
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DatasetRepository for InMemoryRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<RemoteDataset>> {
        Ok(self.lock().datasets.get(name).map(|d| d.remote.clone()))
    }

    async fn upsert(
        &self,
        dataset: &Dataset,
        existing: Option<&RemoteDataset>,
        stamp: &RunStamp,
    ) -> Result<UpsertOutcome> {
        let mut state = self.lock();
        let current = state.datasets.get(&dataset.name).map(|d| d.remote.clone());

        let (action, id, previous) = match (existing, current) {
            (None, Some(_)) => {
                return Err(PublishError::api(
                    "package_create",
                    Some(409),
                    "That URL is already in use.",
                ))
            },
            (Some(wanted), None) => {
                return Err(PublishError::api(
                    "package_patch",
                    Some(404),
                    format!("dataset '{}' not found", wanted.id),
                ))
            },
            (None, None) => (UpsertAction::Created, Uuid::new_v4().to_string(), Vec::new()),
            (Some(_), Some(current)) => (UpsertAction::Updated, current.id, current.resources),
        };

        let resources: Vec<RemoteResource> = dataset
            .resources
            .iter()
            .map(|resource| RemoteResource {
                id: previous
                    .iter()
                    .find(|r| r.name == resource.name)
                    .map(|r| r.id.clone())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                name: resource.name.clone(),
                format: Some(resource.format.hdx_label().to_string()),
            })
            .collect();

        let resources_removed = previous
            .iter()
            .filter(|r| !resources.iter().any(|n| n.id == r.id))
            .count();
        let bytes_uploaded = dataset
            .resources
            .iter()
            .filter_map(|r| std::fs::metadata(&r.path).ok())
            .map(|m| m.len())
            .sum();

        let remote = RemoteDataset {
            id: id.clone(),
            name: dataset.name.clone(),
            resources,
        };
        let resources_uploaded = remote.resources.len();

        state.datasets.insert(
            dataset.name.clone(),
            StoredDataset {
                remote,
                title: dataset.title.clone(),
                dataset_date: dataset.time_period.to_hdx_date(),
                batch: stamp.batch,
            },
        );
        match action {
            UpsertAction::Created => state.creates += 1,
            UpsertAction::Updated => state.updates += 1,
        }

        Ok(UpsertOutcome {
            action,
            dataset_id: id,
            dataset_name: dataset.name.clone(),
            resources_uploaded,
            resources_removed,
            bytes_uploaded,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dataset::DatasetBuilder;
    use crate::hdx::UPDATED_BY_SCRIPT;
    use crate::template::DatasetTemplate;
    use crate::test_helpers::{khm, write_country_files};
    use tempfile::TempDir;

    fn khm_dataset(dir: &TempDir) -> Dataset {
        write_country_files(dir.path(), khm());
        DatasetBuilder::new(dir.path(), DatasetTemplate::embedded().unwrap())
            .build(khm())
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_update_keeps_ids() {
        let dir = TempDir::new().unwrap();
        let dataset = khm_dataset(&dir);
        let repo = InMemoryRepository::new();
        let stamp = RunStamp::new(UPDATED_BY_SCRIPT);

        assert!(repo.find_by_name("khm-adpc-gem").await.unwrap().is_none());
        let created = repo.upsert(&dataset, None, &stamp).await.unwrap();
        assert_eq!(created.action, UpsertAction::Created);
        assert_eq!(created.resources_uploaded, 9);
        assert!(created.bytes_uploaded > 0);

        let existing = repo.find_by_name("khm-adpc-gem").await.unwrap().unwrap();
        let updated = repo.upsert(&dataset, Some(&existing), &stamp).await.unwrap();
        assert_eq!(updated.action, UpsertAction::Updated);
        assert_eq!(updated.dataset_id, created.dataset_id);

        let stored = repo.get("khm-adpc-gem").unwrap();
        assert_eq!(stored.remote.resources, existing.resources);
        assert_eq!(repo.len(), 1);
        assert_eq!((repo.create_count(), repo.update_count()), (1, 1));
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let dir = TempDir::new().unwrap();
        let dataset = khm_dataset(&dir);
        let repo = InMemoryRepository::new();
        let stamp = RunStamp::new(UPDATED_BY_SCRIPT);

        repo.upsert(&dataset, None, &stamp).await.unwrap();
        let err = repo.upsert(&dataset, None, &stamp).await.unwrap_err();
        assert!(matches!(err, PublishError::Api { status: Some(409), .. }));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_resources_removed() {
        let dir = TempDir::new().unwrap();
        let dataset = khm_dataset(&dir);
        let repo = InMemoryRepository::new();
        let stamp = RunStamp::new(UPDATED_BY_SCRIPT);

        repo.upsert(&dataset, None, &stamp).await.unwrap();
        let mut existing = repo.find_by_name("khm-adpc-gem").await.unwrap().unwrap();
        existing.resources.push(RemoteResource {
            id: "old".into(),
            name: "khm-gem-legacy.csv".into(),
            format: None,
        });
        repo.lock().datasets.get_mut("khm-adpc-gem").unwrap().remote = existing.clone();

        let outcome = repo.upsert(&dataset, Some(&existing), &stamp).await.unwrap();
        assert_eq!(outcome.resources_removed, 1);
        assert_eq!(repo.get("khm-adpc-gem").unwrap().remote.resources.len(), 9);
    }

    #[tokio::test]
    async fn test_duplicate_named_resource_removed() {
        let dir = TempDir::new().unwrap();
        let dataset = khm_dataset(&dir);
        let repo = InMemoryRepository::new();
        let stamp = RunStamp::new(UPDATED_BY_SCRIPT);

        repo.upsert(&dataset, None, &stamp).await.unwrap();
        let mut existing = repo.find_by_name("khm-adpc-gem").await.unwrap().unwrap();
        let mut copy = existing.resources[0].clone();
        copy.id = "copy".into();
        existing.resources.push(copy);
        repo.lock().datasets.get_mut("khm-adpc-gem").unwrap().remote = existing.clone();

        let outcome = repo.upsert(&dataset, Some(&existing), &stamp).await.unwrap();
        assert_eq!(outcome.resources_removed, 1);
        let stored = repo.get("khm-adpc-gem").unwrap();
        assert!(stored.remote.resources.iter().all(|r| r.id != "copy"));
    }
}
