//! CKAN action API request and response types

use crate::dataset::{Dataset, Resource};
use crate::hdx::repository::RunStamp;
use crate::template::{DatasetMetadata, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Envelope wrapping every action API response
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    pub error: Option<ActionError>,
}

/// `error` object of a failed action.
///
/// Validation failures carry one entry per offending field next to
/// `__type`, e.g. `{"__type": "Validation Error", "name": ["That URL is already in use."]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionError {
    pub message: Option<String>,
    #[serde(rename = "__type")]
    pub error_type: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ActionError {
    /// Single-line description for error messages
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(kind) = &self.error_type {
            parts.push(kind.clone());
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        for (field, value) in &self.fields {
            parts.push(format!("{}: {}", field, value));
        }

        if parts.is_empty() {
            "unknown error".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// A dataset as HDX knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resources: Vec<RemoteResource>,
}

impl RemoteDataset {
    /// Remote resource with the given name, if any
    pub fn resource_named(&self, name: &str) -> Option<&RemoteResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef<'a> {
    pub name: &'a str,
}

/// Body of `package_create` and `package_patch`
#[derive(Debug, Clone, Serialize)]
pub struct PackagePayload<'a> {
    /// Set only when patching an existing dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub name: &'a str,
    pub title: &'a str,
    pub dataset_date: String,
    pub groups: Vec<GroupRef<'a>>,
    pub tags: &'a [Tag],
    /// CKAN stores booleans on packages as "0"/"1"
    pub subnational: &'static str,
    #[serde(flatten)]
    pub metadata: &'a DatasetMetadata,
    pub updated_by_script: &'a str,
    pub batch: String,
}

impl<'a> PackagePayload<'a> {
    pub fn new(dataset: &'a Dataset, existing_id: Option<&'a str>, stamp: &'a RunStamp) -> Self {
        Self {
            id: existing_id,
            name: &dataset.name,
            title: &dataset.title,
            dataset_date: dataset.time_period.to_hdx_date(),
            groups: dataset.groups.iter().map(|name| GroupRef { name }).collect(),
            tags: &dataset.tags,
            subnational: if dataset.subnational { "1" } else { "0" },
            metadata: &dataset.metadata,
            updated_by_script: &stamp.updated_by_script,
            batch: stamp.batch.to_string(),
        }
    }
}

/// Text fields sent alongside a resource upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFields {
    pub name: String,
    pub description: String,
    pub format: String,
}

impl From<&Resource> for ResourceFields {
    fn from(resource: &Resource) -> Self {
        Self {
            name: resource.name.clone(),
            description: resource.description.clone(),
            format: resource.format.hdx_label().to_string(),
        }
    }
}

/// Body of `package_resource_reorder`
#[derive(Debug, Clone, Serialize)]
pub struct ReorderRequest<'a> {
    pub id: &'a str,
    pub order: Vec<&'a str>,
}

/// Body of `resource_delete`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub id: &'a str,
}
