//! The remote dataset store seen by the publisher

use crate::dataset::Dataset;
use crate::error::Result;
use crate::hdx::types::RemoteDataset;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Script name recorded in `updated_by_script`
pub const UPDATED_BY_SCRIPT: &str = "HDX Scraper: ADPC GEM";

/// Identity of one run, stamped onto every dataset it touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    pub batch: Uuid,
    pub updated_by_script: String,
}

impl RunStamp {
    pub fn new(script_name: &str) -> Self {
        Self {
            batch: Uuid::new_v4(),
            updated_by_script: format!(
                "{} ({})",
                script_name,
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl std::fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertAction::Created => write!(f, "created"),
            UpsertAction::Updated => write!(f, "updated"),
        }
    }
}

/// What an upsert did to the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub dataset_id: String,
    pub dataset_name: String,
    pub resources_uploaded: usize,
    /// Remote resources deleted because no local file matches them
    pub resources_removed: usize,
    pub bytes_uploaded: u64,
}

/// A store of datasets keyed by their HDX name.
///
/// `upsert` must leave exactly one dataset under `dataset.name` holding
/// exactly the resources of `dataset`, in order, whether or not one existed.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Look a dataset up by name; `Ok(None)` when it does not exist
    async fn find_by_name(&self, name: &str) -> Result<Option<RemoteDataset>>;

    /// Create the dataset when `existing` is `None`, update it in place otherwise
    async fn upsert(
        &self,
        dataset: &Dataset,
        existing: Option<&RemoteDataset>,
        stamp: &RunStamp,
    ) -> Result<UpsertOutcome>;
}
