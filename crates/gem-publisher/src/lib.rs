//! ADPC Gender Equality Monitor publisher
//!
//! Publishes one HDX dataset per Lower Mekong country from pre-split local
//! files produced by ADPC's Gender Equality Monitor.
//!
//! # Overview
//!
//! - **Selection**: restrict a run to some countries (`--countries KHM,THA`)
//! - **Building**: assemble name, title, metadata, tags and nine resources per country
//! - **Publishing**: create or update each dataset on HDX (`adpc-gem publish`)
//! - **Previewing**: print the payloads without sending them (`adpc-gem preview`)
//! - **Inspection**: show which country files are present (`adpc-gem countries`)
//!
//! # Data layout
//!
//! The data files are not shipped with the crate. Point `--data-dir` (or
//! `GEM_DATA_DIR`) at a directory with one lowercase ISO3 sub-directory per
//! country; without it, `./data` relative to the working directory is used.
//!
//! ```text
//! data/
//! └── khm/
//!     ├── khm-gem-gii-national.csv
//!     ├── khm-gem-gii-subnational.csv
//!     ├── khm-gem-dimension-national.csv
//!     ├── khm-gem-dimension-subnational.csv
//!     ├── khm-gem-indicator-national.csv
//!     ├── khm-gem-indicator-subnational.csv
//!     ├── khm-gem-sex-disaggregated.csv
//!     ├── khm-gem-country-boundary.geojson
//!     └── khm-gem-province-boundaries.geojson
//! ```
//!
//! `adpc-gem countries` reports how many of the nine files each country has.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod country;
pub mod dataset;
pub mod error;
pub mod hdx;
pub mod progress;
pub mod publisher;
pub mod template;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use error::{PublishError, Result};
pub use publisher::{PublishReport, Publisher};

use crate::config::{CredentialSources, ExtraParams, DEFAULT_DATA_DIR, DEFAULT_TIMEOUT_SECS};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Publish ADPC Gender Equality Monitor datasets to HDX
#[derive(Parser, Debug)]
#[command(name = "adpc-gem")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// HDX site: prod, feature, demo, stage or a base URL
    #[arg(long, env = "HDX_SITE", global = true)]
    pub hdx_site: Option<String>,

    /// HDX API key
    #[arg(long, env = "HDX_KEY", hide_env_values = true, global = true)]
    pub hdx_key: Option<String>,

    /// User agent sent to HDX
    #[arg(long, env = "USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// HDX configuration YAML (defaults to ~/.hdx_configuration.yaml)
    #[arg(long, env = "HDX_CONFIG_YAML", global = true)]
    pub hdx_config: Option<PathBuf>,

    /// User agent YAML (defaults to ~/.useragents.yaml)
    #[arg(long, env = "USER_AGENT_CONFIG_YAML", global = true)]
    pub user_agent_config: Option<PathBuf>,

    /// Extra `key=value` overrides, e.g. `countries=KHM,THA,hdx_site=prod`
    #[arg(long, env = "EXTRA_PARAMS", global = true)]
    pub extra_params: Option<String>,

    /// Print the CLI reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

impl Cli {
    /// Credential inputs, with `EXTRA_PARAMS` filling a missing site
    pub fn credential_sources(&self, extra: &ExtraParams) -> CredentialSources {
        CredentialSources {
            hdx_key: self.hdx_key.clone(),
            user_agent: self.user_agent.clone(),
            hdx_site: self.hdx_site.clone().or_else(|| extra.hdx_site.clone()),
            hdx_config_path: self.hdx_config.clone(),
            user_agent_config_path: self.user_agent_config.clone(),
            timeout_secs: None,
        }
    }
}

/// Where the country files and dataset templates come from
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Comma-separated ISO3 codes to process (default: all)
    #[arg(short, long)]
    pub countries: Option<String>,

    /// Directory holding one sub-directory of files per country, e.g.
    /// `<dir>/khm/khm-gem-gii-national.csv` [default: ./data]
    #[arg(long, env = "GEM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory with replacement hdx_dataset_static.yaml and project_configuration.yaml
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

impl DataArgs {
    /// Fill unset values from `EXTRA_PARAMS`; explicit flags win
    pub fn merged(&self, extra: &ExtraParams) -> Self {
        Self {
            countries: self.countries.clone().or_else(|| extra.countries.clone()),
            data_dir: self.data_dir.clone().or_else(|| extra.data_dir.clone()),
            config_dir: self.config_dir.clone(),
        }
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update the HDX dataset of each selected country
    Publish {
        #[command(flatten)]
        data: DataArgs,

        /// Seconds allowed for each country's remote work
        #[arg(long, env = "HDX_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Build and validate everything without contacting HDX
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the dataset payloads as JSON without contacting HDX
    Preview {
        #[command(flatten)]
        data: DataArgs,
    },

    /// List supported countries and their local files
    Countries {
        #[command(flatten)]
        data: DataArgs,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_publish_args() {
        let cli = Cli::try_parse_from([
            "adpc-gem",
            "publish",
            "--countries",
            "KHM,THA",
            "--data-dir",
            "/tmp/gem",
            "--timeout-secs",
            "60",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Publish {
                data,
                timeout_secs,
                dry_run,
            }) => {
                assert_eq!(data.countries.as_deref(), Some("KHM,THA"));
                assert_eq!(data.data_dir, Some(PathBuf::from("/tmp/gem")));
                assert_eq!(timeout_secs, 60);
                assert!(dry_run);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_data_args_merge_prefers_flags() {
        let extra = ExtraParams::parse("countries=LAO,MMR,data_dir=/srv/gem").unwrap();

        let flags = DataArgs {
            countries: Some("KHM".into()),
            ..DataArgs::default()
        };
        let merged = flags.merged(&extra);
        assert_eq!(merged.countries.as_deref(), Some("KHM"));
        assert_eq!(merged.data_dir_or_default(), PathBuf::from("/srv/gem"));

        let merged = DataArgs::default().merged(&ExtraParams::default());
        assert_eq!(merged.data_dir_or_default(), PathBuf::from(DEFAULT_DATA_DIR));
    }
}
