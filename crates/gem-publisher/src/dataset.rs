//! Dataset and resource records, and the builder that assembles them
//!
//! Every country dataset carries the same nine resources in the same order:
//! seven CSV tables followed by two GeoJSON boundary files.

use crate::country::Country;
use crate::error::{PublishError, Result};
use crate::template::{DatasetMetadata, DatasetTemplate, Tag};
use gem_common::types::ResourceFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fallback time period when no CSV has a usable `year` value
pub const DEFAULT_START_YEAR: i32 = 2000;
pub const DEFAULT_END_YEAR: i32 = 2024;

/// Number of resources attached to every dataset
pub const RESOURCE_COUNT: usize = ResourceKind::ALL.len();

/// The nine per-country files, in publishing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    GiiNational,
    GiiSubnational,
    DimensionNational,
    DimensionSubnational,
    IndicatorNational,
    IndicatorSubnational,
    SexDisaggregated,
    CountryBoundary,
    ProvinceBoundaries,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::GiiNational,
        ResourceKind::GiiSubnational,
        ResourceKind::DimensionNational,
        ResourceKind::DimensionSubnational,
        ResourceKind::IndicatorNational,
        ResourceKind::IndicatorSubnational,
        ResourceKind::SexDisaggregated,
        ResourceKind::CountryBoundary,
        ResourceKind::ProvinceBoundaries,
    ];

    /// File name segment after `<iso3>-gem-`
    pub fn suffix(self) -> &'static str {
        match self {
            ResourceKind::GiiNational => "gii-national",
            ResourceKind::GiiSubnational => "gii-subnational",
            ResourceKind::DimensionNational => "dimension-national",
            ResourceKind::DimensionSubnational => "dimension-subnational",
            ResourceKind::IndicatorNational => "indicator-national",
            ResourceKind::IndicatorSubnational => "indicator-subnational",
            ResourceKind::SexDisaggregated => "sex-disaggregated",
            ResourceKind::CountryBoundary => "country-boundary",
            ResourceKind::ProvinceBoundaries => "province-boundaries",
        }
    }

    pub fn format(self) -> ResourceFormat {
        match self {
            ResourceKind::CountryBoundary | ResourceKind::ProvinceBoundaries => {
                ResourceFormat::GeoJson
            },
            _ => ResourceFormat::Csv,
        }
    }

    /// File name, which is also the HDX resource name
    pub fn file_name(self, iso3_slug: &str) -> String {
        format!("{}-gem-{}.{}", iso3_slug, self.suffix(), self.format().extension())
    }

    pub fn description(self, country_name: &str) -> String {
        match self {
            ResourceKind::GiiNational => {
                format!("National Gender Inequality Index scores for {}", country_name)
            },
            ResourceKind::GiiSubnational => {
                format!("Subnational Gender Inequality Index scores for {}", country_name)
            },
            ResourceKind::DimensionNational => {
                format!("National Gender Inequality Index by dimension for {}", country_name)
            },
            ResourceKind::DimensionSubnational => format!(
                "Subnational Gender Inequality Index by dimension for {}",
                country_name
            ),
            ResourceKind::IndicatorNational => {
                format!("National Gender Inequality Index by indicator for {}", country_name)
            },
            ResourceKind::IndicatorSubnational => format!(
                "Subnational Gender Inequality Index by indicator for {}",
                country_name
            ),
            ResourceKind::SexDisaggregated => {
                format!("Sex-disaggregated data for {}", country_name)
            },
            ResourceKind::CountryBoundary => format!("Country boundary for {}", country_name),
            ResourceKind::ProvinceBoundaries => {
                format!("Province boundaries for {}", country_name)
            },
        }
    }
}

/// One file attachment of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub name: String,
    pub description: String,
    pub format: ResourceFormat,
    pub path: PathBuf,
    /// Zero-based position within the dataset
    pub position: usize,
    pub kind: ResourceKind,
}

/// Inclusive year range covered by a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimePeriod {
    pub start_year: i32,
    pub end_year: i32,
}

impl TimePeriod {
    /// HDX `dataset_date` form, e.g. `[1990-01-01T00:00:00 TO 2019-12-31T23:59:59]`
    pub fn to_hdx_date(self) -> String {
        format!(
            "[{}-01-01T00:00:00 TO {}-12-31T23:59:59]",
            self.start_year, self.end_year
        )
    }
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_START_YEAR,
            end_year: DEFAULT_END_YEAR,
        }
    }
}

/// A country dataset ready to be published
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub iso3: String,
    /// HDX identifying name, e.g. `khm-adpc-gem`
    pub name: String,
    pub title: String,
    /// HDX location groups (lowercase ISO3)
    pub groups: Vec<String>,
    pub tags: Vec<Tag>,
    pub time_period: TimePeriod,
    pub subnational: bool,
    pub metadata: DatasetMetadata,
    pub resources: Vec<Resource>,
}

/// Builds datasets from the per-country files under a data directory
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    data_dir: PathBuf,
    template: DatasetTemplate,
}

impl DatasetBuilder {
    pub fn new(data_dir: impl Into<PathBuf>, template: DatasetTemplate) -> Self {
        Self {
            data_dir: data_dir.into(),
            template,
        }
    }

    pub fn template(&self) -> &DatasetTemplate {
        &self.template
    }

    /// Assemble the dataset for one country.
    ///
    /// Fails with [`PublishError::MissingResourceFile`] on the first of the
    /// nine files that is not present.
    pub fn build(&self, country: &Country) -> Result<Dataset> {
        let slug = country.slug();
        let mut resources = Vec::with_capacity(RESOURCE_COUNT);

        for (position, kind) in ResourceKind::ALL.into_iter().enumerate() {
            let path = country.resource_path(&self.data_dir, kind);
            if !path.is_file() {
                return Err(PublishError::MissingResourceFile {
                    country: country.iso3.to_string(),
                    path,
                });
            }

            resources.push(Resource {
                name: kind.file_name(&slug),
                description: kind.description(country.name),
                format: kind.format(),
                path,
                position,
                kind,
            });
        }

        let time_period = self.time_period(&resources)?;
        debug!(
            iso3 = country.iso3,
            start = time_period.start_year,
            end = time_period.end_year,
            "Resolved dataset time period"
        );

        Ok(Dataset {
            iso3: country.iso3.to_string(),
            name: format!("{}-{}", slug, self.template.name_suffix),
            title: format!("{} - {}", country.name, self.template.title_suffix),
            groups: vec![slug],
            tags: self.template.tags.clone(),
            time_period,
            subnational: true,
            metadata: self.template.metadata.clone(),
            resources,
        })
    }

    /// Min and max `year` across the CSV resources, or the default range
    fn time_period(&self, resources: &[Resource]) -> Result<TimePeriod> {
        let mut range: Option<(i32, i32)> = None;

        for resource in resources.iter().filter(|r| r.format == ResourceFormat::Csv) {
            let scan = scan_years(&resource.path)?;
            if scan.rows == 0 {
                warn!(resource = %resource.name, "Resource has no data rows");
            }
            if let Some((lo, hi)) = scan.range {
                range = Some(match range {
                    Some((min, max)) => (min.min(lo), max.max(hi)),
                    None => (lo, hi),
                });
            }
        }

        Ok(range
            .map(|(start_year, end_year)| TimePeriod {
                start_year,
                end_year,
            })
            .unwrap_or_default())
    }
}

struct YearScan {
    rows: usize,
    range: Option<(i32, i32)>,
}

/// Read the `year` column of a CSV file; non-integer cells and unreadable
/// rows are skipped
fn scan_years(path: &Path) -> Result<YearScan> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let year_index = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("year"));

    let mut rows = 0;
    let mut range: Option<(i32, i32)> = None;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable CSV row");
                continue;
            },
        };
        rows += 1;

        let Some(year) = year_index
            .and_then(|i| record.get(i))
            .and_then(|cell| cell.trim().parse::<i32>().ok())
        else {
            continue;
        };

        range = Some(match range {
            Some((min, max)) => (min.min(year), max.max(year)),
            None => (year, year),
        });
    }

    Ok(YearScan { rows, range })
}
