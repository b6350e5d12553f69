//! Configuration for the GEM publisher
//!
//! Credentials and site selection are resolved once into an [`HdxConfig`]
//! value that is handed to the HDX client; nothing downstream reads the
//! environment.

use crate::error::{PublishError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Key under which this scraper's user agent is stored in the user-agent YAML
pub const USER_AGENT_LOOKUP: &str = "hdx-scraper-adpc-gem";

/// Default HDX config file in the user's home directory
pub const DEFAULT_HDX_CONFIG_FILE: &str = ".hdx_configuration.yaml";

/// Default user-agent file in the user's home directory
pub const DEFAULT_USER_AGENT_FILE: &str = ".useragents.yaml";

/// Default per-country publish timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default directory holding the per-country data files, relative to the
/// working directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// HDX instance to publish to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HdxSite {
    Prod,
    Feature,
    #[default]
    Demo,
    Stage,
    /// Explicit base URL, e.g. a local test server
    Custom(String),
}

impl HdxSite {
    /// Base URL of the CKAN instance, without trailing slash
    pub fn base_url(&self) -> &str {
        match self {
            HdxSite::Prod => "https://data.humdata.org",
            HdxSite::Feature => "https://feature.data-humdata-org.ahconu.org",
            HdxSite::Demo => "https://demo.data-humdata-org.ahconu.org",
            HdxSite::Stage => "https://stage.data-humdata-org.ahconu.org",
            HdxSite::Custom(url) => url.trim_end_matches('/'),
        }
    }
}

impl FromStr for HdxSite {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            return Ok(HdxSite::Custom(value.to_string()));
        }
        match value.to_lowercase().as_str() {
            "prod" => Ok(HdxSite::Prod),
            "feature" => Ok(HdxSite::Feature),
            "demo" => Ok(HdxSite::Demo),
            "stage" => Ok(HdxSite::Stage),
            _ => Err(PublishError::config(format!(
                "unknown HDX site '{}' (expected prod, feature, demo, stage or a URL)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for HdxSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HdxSite::Prod => write!(f, "prod"),
            HdxSite::Feature => write!(f, "feature"),
            HdxSite::Demo => write!(f, "demo"),
            HdxSite::Stage => write!(f, "stage"),
            HdxSite::Custom(url) => write!(f, "{}", url),
        }
    }
}

/// Raw inputs for [`HdxConfig::resolve`], as collected from the CLI and env
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub hdx_key: Option<String>,
    pub user_agent: Option<String>,
    pub hdx_site: Option<String>,
    /// Explicit HDX config YAML; `None` means `~/.hdx_configuration.yaml` if present
    pub hdx_config_path: Option<PathBuf>,
    /// Explicit user-agent YAML; `None` means `~/.useragents.yaml` if present
    pub user_agent_config_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Resolved connection settings for the HDX API
#[derive(Clone)]
pub struct HdxConfig {
    pub site: HdxSite,
    pub api_key: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HdxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdxConfig")
            .field("site", &self.site)
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct HdxConfigFile {
    hdx_key: Option<String>,
    hdx_site: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserAgentEntry {
    #[serde(default)]
    preprefix: Option<String>,
    user_agent: String,
}

impl HdxConfig {
    /// Resolve credentials, failing before any network use if one is missing
    pub fn resolve(sources: &CredentialSources) -> Result<Self> {
        let file = load_hdx_config_file(sources.hdx_config_path.as_deref())?;

        let api_key = non_empty(sources.hdx_key.clone())
            .or_else(|| non_empty(file.hdx_key.clone()))
            .ok_or_else(|| {
                PublishError::config(
                    "no HDX API key: set HDX_KEY or add hdx_key to ~/.hdx_configuration.yaml",
                )
            })?;

        let user_agent = match non_empty(sources.user_agent.clone()) {
            Some(agent) => agent,
            None => load_user_agent(sources.user_agent_config_path.as_deref())?.ok_or_else(
                || {
                    PublishError::config(format!(
                        "no user agent: set USER_AGENT or add a '{}' entry to ~/.useragents.yaml",
                        USER_AGENT_LOOKUP
                    ))
                },
            )?,
        };

        let site = match non_empty(sources.hdx_site.clone()).or(file.hdx_site) {
            Some(site) => site.parse()?,
            None => HdxSite::default(),
        };

        let timeout_secs = sources.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(PublishError::config("timeout must be at least one second"));
        }

        debug!(site = %site, user_agent = %user_agent, "Resolved HDX configuration");

        Ok(Self {
            site,
            api_key,
            user_agent,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        self.site.base_url()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Explicit paths must exist; the home-directory default is optional
fn config_path(explicit: Option<&Path>, default_name: &str) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(PublishError::config(format!(
            "config file '{}' does not exist",
            path.display()
        ))),
        None => Ok(dirs::home_dir()
            .map(|home| home.join(default_name))
            .filter(|path| path.is_file())),
    }
}

fn load_hdx_config_file(explicit: Option<&Path>) -> Result<HdxConfigFile> {
    let Some(path) = config_path(explicit, DEFAULT_HDX_CONFIG_FILE)? else {
        return Ok(HdxConfigFile::default());
    };
    let content = std::fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(HdxConfigFile::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

fn load_user_agent(explicit: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = config_path(explicit, DEFAULT_USER_AGENT_FILE)? else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(&path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    // Other scrapers' entries share the file and are left unparsed
    let document: serde_yaml::Value = serde_yaml::from_str(&content)?;
    let Some(raw) = document.get(USER_AGENT_LOOKUP) else {
        return Ok(None);
    };
    let entry: UserAgentEntry = serde_yaml::from_value(raw.clone())?;

    Ok(Some(match non_empty(entry.preprefix) {
        Some(prefix) => format!("{}:{}", prefix, entry.user_agent),
        None => entry.user_agent,
    }))
}

/// Overrides passed through `EXTRA_PARAMS`, e.g. `countries=KHM,THA,hdx_site=prod`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraParams {
    pub countries: Option<String>,
    pub hdx_site: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ExtraParams {
    /// Parse comma-separated `key=value` pairs.
    ///
    /// A fragment without `=` continues the previous value, so list values
    /// such as `countries=KHM,THA` survive the comma split. Unknown keys are
    /// logged and ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for fragment in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match fragment.split_once('=') {
                Some((key, value)) => {
                    pairs.push((key.trim().to_lowercase(), value.trim().to_string()))
                },
                None => match pairs.last_mut() {
                    Some((_, value)) => {
                        value.push(',');
                        value.push_str(fragment);
                    },
                    None => {
                        return Err(PublishError::config(format!(
                            "EXTRA_PARAMS fragment '{}' has no key",
                            fragment
                        )))
                    },
                },
            }
        }

        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "countries" => params.countries = Some(value),
                "hdx_site" => params.hdx_site = Some(value),
                "data_dir" => params.data_dir = Some(PathBuf::from(value)),
                _ => warn!(key = %key, "Ignoring unknown EXTRA_PARAMS key"),
            }
        }

        Ok(params)
    }
}
