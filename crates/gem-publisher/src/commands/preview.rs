//! `adpc-gem preview` command implementation
//!
//! Prints the payloads a publish run would send, as JSON, without touching HDX.

use crate::commands::resolve_selection;
use crate::dataset::{Dataset, DatasetBuilder, Resource};
use crate::error::{PublishError, Result};
use crate::hdx::{PackagePayload, RunStamp, UPDATED_BY_SCRIPT};
use crate::template::DatasetTemplate;
use serde::Serialize;
use std::path::PathBuf;
use tracing::error;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub countries: Option<String>,
    pub data_dir: PathBuf,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DatasetPreview<'a> {
    package: PackagePayload<'a>,
    resources: &'a [Resource],
}

/// Run the preview command
pub async fn run(options: PreviewOptions) -> Result<()> {
    let selection = resolve_selection(options.countries.as_deref())?;
    let template = DatasetTemplate::resolve(options.config_dir.as_deref())?;
    let builder = DatasetBuilder::new(&options.data_dir, template);
    let stamp = RunStamp::new(UPDATED_BY_SCRIPT);

    let mut datasets: Vec<Dataset> = Vec::new();
    let mut failed = 0;
    for country in &selection.countries {
        match builder.build(country) {
            Ok(dataset) => datasets.push(dataset),
            Err(e) => {
                error!(iso3 = country.iso3, error_kind = e.kind(), error = %e, "Cannot build dataset");
                failed += 1;
            },
        }
    }

    println!("{}", render(&datasets, &stamp)?);

    if failed > 0 {
        return Err(PublishError::PartialFailure {
            failed,
            total: selection.countries.len(),
        });
    }
    Ok(())
}

fn render(datasets: &[Dataset], stamp: &RunStamp) -> Result<String> {
    let previews: Vec<DatasetPreview<'_>> = datasets
        .iter()
        .map(|dataset| DatasetPreview {
            package: PackagePayload::new(dataset, None, stamp),
            resources: &dataset.resources,
        })
        .collect();

    Ok(serde_json::to_string_pretty(&previews)?)
}
