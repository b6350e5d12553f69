//! Country-by-country publishing
//!
//! Each country is built locally, then pushed to the repository under a
//! deadline. A failure is recorded against its country and the run moves on.

use crate::country::Country;
use crate::dataset::{Dataset, DatasetBuilder};
use crate::error::{PublishError, Result};
use crate::hdx::{DatasetRepository, RunStamp, UpsertOutcome};
use indicatif::ProgressBar;
use std::time::Duration;
use tracing::{error, info, info_span, Instrument};

/// Run-wide publishing settings
#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Deadline for the remote part of one country
    pub timeout: Duration,
    pub stamp: RunStamp,
}

/// Result for one country
#[derive(Debug)]
pub struct CountryOutcome {
    pub country: &'static Country,
    pub result: Result<UpsertOutcome>,
}

/// Per-country results of a run, in processing order
#[derive(Debug, Default)]
pub struct PublishReport {
    pub outcomes: Vec<CountryOutcome>,
}

impl PublishReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&'static Country, &UpsertOutcome)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.country, r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&'static Country, &PublishError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.country, e)))
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// `Ok` when every country succeeded, [`PublishError::PartialFailure`] otherwise
    pub fn into_result(self) -> Result<()> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(PublishError::PartialFailure {
                failed,
                total: self.total(),
            }),
        }
    }
}

pub struct Publisher<R> {
    repository: R,
    builder: DatasetBuilder,
    settings: PublishSettings,
}

impl<R: DatasetRepository> Publisher<R> {
    pub fn new(repository: R, builder: DatasetBuilder, settings: PublishSettings) -> Self {
        Self {
            repository,
            builder,
            settings,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Build and upsert one country's dataset
    pub async fn publish_country(&self, country: &Country) -> Result<UpsertOutcome> {
        let dataset = self.builder.build(country)?;

        tokio::time::timeout(self.settings.timeout, self.push(&dataset))
            .await
            .map_err(|_| {
                PublishError::timeout(
                    format!("Publishing {}", dataset.name),
                    self.settings.timeout.as_secs(),
                )
            })?
    }

    async fn push(&self, dataset: &Dataset) -> Result<UpsertOutcome> {
        let existing = self.repository.find_by_name(&dataset.name).await?;
        match &existing {
            Some(remote) => info!(dataset = %dataset.name, id = %remote.id, "Updating existing dataset"),
            None => info!(dataset = %dataset.name, "Creating dataset"),
        }

        self.repository
            .upsert(dataset, existing.as_ref(), &self.settings.stamp)
            .await
    }

    /// Publish each country in order; never stops early
    pub async fn publish_all(
        &self,
        countries: &[&'static Country],
        progress: &ProgressBar,
    ) -> PublishReport {
        let mut report = PublishReport::default();

        for &country in countries {
            let span = info_span!("country", iso3 = country.iso3);
            progress.set_message(country.name);

            let result = self.publish_country(country).instrument(span.clone()).await;

            span.in_scope(|| match &result {
                Ok(outcome) => info!(
                    dataset = %outcome.dataset_name,
                    action = %outcome.action,
                    resources = outcome.resources_uploaded,
                    removed = outcome.resources_removed,
                    "Country published"
                ),
                Err(e) => error!(error_kind = e.kind(), error = %e, "Country failed"),
            });

            progress.inc(1);
            report.outcomes.push(CountryOutcome { country, result });
        }

        progress.finish_and_clear();
        report
    }
}
