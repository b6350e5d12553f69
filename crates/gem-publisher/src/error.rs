//! Error types for the GEM publisher
//!
//! Messages are user-facing: they say what went wrong and, where there is
//! one, what to change before the next run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for publisher operations
pub type Result<T> = std::result::Result<T, PublishError>;

/// Error type for selection, building and publishing
#[derive(Error, Debug)]
pub enum PublishError {
    /// Credentials or settings are missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or config files.")]
    Config(String),

    /// The country filter matched none of the supported countries
    #[error("No supported countries selected from '{0}'. Supported codes: KHM, LAO, MMR, THA, VNM.")]
    NoCountriesSelected(String),

    /// A file the dataset needs is not on disk
    #[error("Missing resource file for {country}: '{}'. Check --data-dir and the per-country file set.", .path.display())]
    MissingResourceFile { country: String, path: PathBuf },

    /// HDX answered with an error envelope or a failing status
    #[error("HDX {action} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Api {
        action: String,
        status: Option<u16>,
        message: String,
    },

    /// The API key cannot create datasets in the owning organisation
    #[error("Access denied: {0}. Check that HDX_KEY belongs to a user with editor rights.")]
    AccessDenied(String),

    /// An operation did not finish in time
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// One or more countries failed during a batch
    #[error("{failed} of {total} countries failed to publish. See the log output for details.")]
    PartialFailure { failed: usize, total: usize },

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection and HDX_SITE.")]
    Http(#[from] reqwest::Error),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// CSV reading failed
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Common(#[from] gem_common::GemError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PublishError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API error
    pub fn api(action: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            action: action.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Short label used in structured logs and the run summary
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::NoCountriesSelected(_) | Self::AccessDenied(_) => {
                "configuration"
            },
            Self::MissingResourceFile { .. } => "missing_file",
            Self::Api { .. } => "remote_api",
            Self::Timeout { .. } | Self::Http(_) => "network",
            Self::PartialFailure { .. } => "batch",
            Self::Io(_) | Self::YamlParse(_) | Self::JsonParse(_) | Self::Csv(_) => "local_io",
            Self::Common(_) | Self::Other(_) => "internal",
        }
    }

    /// Whether this error stops the whole run rather than a single country
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::NoCountriesSelected(_) | Self::AccessDenied(_)
        )
    }
}
