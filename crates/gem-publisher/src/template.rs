//! Static dataset metadata and tagging
//!
//! `hdx_dataset_static.yaml` carries the fields that are identical for every
//! country dataset; `project_configuration.yaml` carries naming and tags. Both
//! ship embedded in the binary and can be replaced with `--config-dir`.

use crate::error::{PublishError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STATIC_METADATA_FILE: &str = "hdx_dataset_static.yaml";
pub const PROJECT_CONFIG_FILE: &str = "project_configuration.yaml";

const EMBEDDED_STATIC_METADATA: &str = include_str!("../config/hdx_dataset_static.yaml");
const EMBEDDED_PROJECT_CONFIG: &str = include_str!("../config/project_configuration.yaml");

/// Metadata copied verbatim onto every dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub license_id: String,
    pub methodology: String,
    #[serde(default)]
    pub caveats: Option<String>,
    pub dataset_source: String,
    pub package_creator: String,
    #[serde(default)]
    pub private: bool,
    pub maintainer: String,
    pub owner_org: String,
    /// HDX update frequency in days; `-2` means "as needed"
    pub data_update_frequency: i32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ProjectConfig {
    dataset_name_suffix: String,
    dataset_title_suffix: String,
    tag_vocabulary_id: String,
    tags: Vec<String>,
}

/// A tag under the HDX controlled vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub vocabulary_id: String,
}

/// Everything the builder needs besides the country and its files
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTemplate {
    pub metadata: DatasetMetadata,
    pub name_suffix: String,
    pub title_suffix: String,
    pub tags: Vec<Tag>,
}

impl DatasetTemplate {
    /// Template compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_STATIC_METADATA, EMBEDDED_PROJECT_CONFIG)
    }

    /// Load both YAML files from a directory
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = config_dir.as_ref();
        let static_yaml = read_config_file(&dir.join(STATIC_METADATA_FILE))?;
        let project_yaml = read_config_file(&dir.join(PROJECT_CONFIG_FILE))?;
        Self::from_yaml(&static_yaml, &project_yaml)
    }

    /// `load` when a directory is given, `embedded` otherwise
    pub fn resolve(config_dir: Option<&Path>) -> Result<Self> {
        match config_dir {
            Some(dir) => Self::load(dir),
            None => Self::embedded(),
        }
    }

    fn from_yaml(static_yaml: &str, project_yaml: &str) -> Result<Self> {
        let metadata: DatasetMetadata = serde_yaml::from_str(static_yaml)?;
        let project: ProjectConfig = serde_yaml::from_str(project_yaml)?;

        if project.tags.is_empty() {
            return Err(PublishError::config(format!(
                "{} must list at least one tag",
                PROJECT_CONFIG_FILE
            )));
        }

        let tags = project
            .tags
            .into_iter()
            .map(|name| Tag {
                name,
                vocabulary_id: project.tag_vocabulary_id.clone(),
            })
            .collect();

        Ok(Self {
            metadata,
            name_suffix: project.dataset_name_suffix,
            title_suffix: project.dataset_title_suffix,
            tags,
        })
    }
}

fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PublishError::config(format!("cannot read '{}': {}", path.display(), e))
    })
}
