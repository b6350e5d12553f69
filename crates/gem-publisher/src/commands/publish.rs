//! `adpc-gem publish` command implementation
//!
//! Builds each selected country's dataset and creates or updates it on HDX.

use crate::commands::resolve_selection;
use crate::config::{CredentialSources, HdxConfig};
use crate::dataset::DatasetBuilder;
use crate::error::{PublishError, Result};
use crate::hdx::endpoints::dataset_page_url;
use crate::hdx::{HdxClient, InMemoryRepository, RunStamp, UPDATED_BY_SCRIPT};
use crate::progress::{create_country_progress, format_bytes};
use crate::publisher::{PublishReport, PublishSettings, Publisher};
use crate::template::DatasetTemplate;
use colored::Colorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Inputs of a publish run after CLI and environment merging
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub countries: Option<String>,
    pub data_dir: PathBuf,
    pub config_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Publish into an in-memory store instead of HDX
    pub dry_run: bool,
    pub credentials: CredentialSources,
}

/// Run the publish command
pub async fn run(options: PublishOptions) -> Result<()> {
    if options.timeout_secs == 0 {
        return Err(PublishError::config("--timeout-secs must be at least 1"));
    }

    // Credentials are checked before any file or network access
    let hdx_config = if options.dry_run {
        None
    } else {
        let mut sources = options.credentials.clone();
        sources.timeout_secs = Some(options.timeout_secs);
        Some(HdxConfig::resolve(&sources)?)
    };

    let selection = resolve_selection(options.countries.as_deref())?;
    let template = DatasetTemplate::resolve(options.config_dir.as_deref())?;
    let builder = DatasetBuilder::new(&options.data_dir, template);
    let settings = PublishSettings {
        timeout: Duration::from_secs(options.timeout_secs),
        stamp: RunStamp::new(UPDATED_BY_SCRIPT),
    };

    info!(
        batch = %settings.stamp.batch,
        countries = selection.countries.len(),
        data_dir = %options.data_dir.display(),
        dry_run = options.dry_run,
        "Starting publish run"
    );

    let progress = create_country_progress(
        selection.countries.len() as u64,
        std::io::stderr().is_terminal(),
    );

    let (report, base_url) = match hdx_config {
        None => {
            let publisher = Publisher::new(InMemoryRepository::new(), builder, settings);
            (publisher.publish_all(&selection.countries, &progress).await, None)
        },
        Some(config) => {
            let client = HdxClient::new(&config)?;
            client
                .check_write_access(&builder.template().metadata.owner_org)
                .await?;
            let base_url = client.base_url().to_string();
            let publisher = Publisher::new(client, builder, settings);
            (
                publisher.publish_all(&selection.countries, &progress).await,
                Some(base_url),
            )
        },
    };

    print_summary(&report, base_url.as_deref(), options.dry_run);
    report.into_result()
}

fn print_summary(report: &PublishReport, base_url: Option<&str>, dry_run: bool) {
    println!();
    if dry_run {
        println!("{}", "Dry run: nothing was sent to HDX".yellow().bold());
    }

    for (country, outcome) in report.succeeded() {
        let location = base_url
            .map(|url| dataset_page_url(url, &outcome.dataset_name))
            .unwrap_or_else(|| outcome.dataset_name.clone());
        println!(
            "{} {} {} {} ({} resources, {})",
            "✓".green(),
            country.iso3.bold(),
            outcome.action,
            location,
            outcome.resources_uploaded,
            format_bytes(outcome.bytes_uploaded)
        );
    }

    for (country, error) in report.failed() {
        println!("{} {} {}", "✗".red(), country.iso3.bold(), error);
    }

    println!();
    let succeeded = report.total() - report.failed_count();
    let line = format!("{} of {} countries published", succeeded, report.total());
    if report.is_success() {
        println!("{}", line.green().bold());
    } else {
        println!("{}", line.red().bold());
    }
}
