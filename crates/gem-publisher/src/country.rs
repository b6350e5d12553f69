//! Supported countries and the country filter
//!
//! The Gender Equality Monitor covers five Lower Mekong countries. The list is
//! fixed and its order is the order every run processes countries in.

use crate::dataset::ResourceKind;
use gem_common::types::CountryCode;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A supported country and the static files published for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// Uppercase ISO3 code
    pub iso3: &'static str,
    /// Display name used in titles and descriptions
    pub name: &'static str,
}

/// Canonical processing order
pub static SUPPORTED_COUNTRIES: [Country; 5] = [
    Country { iso3: "KHM", name: "Cambodia" },
    Country { iso3: "LAO", name: "Laos" },
    Country { iso3: "MMR", name: "Myanmar" },
    Country { iso3: "THA", name: "Thailand" },
    Country { iso3: "VNM", name: "Vietnam" },
];

impl Country {
    /// Look up a supported country by code
    pub fn find(code: &CountryCode) -> Option<&'static Country> {
        SUPPORTED_COUNTRIES.iter().find(|c| c.iso3 == code.as_str())
    }

    /// Lowercase ISO3, e.g. `khm`
    pub fn slug(&self) -> String {
        self.iso3.to_ascii_lowercase()
    }

    /// Directory holding this country's files: `<data_dir>/<iso3 lower>`
    pub fn data_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.slug())
    }

    /// Expected on-disk path for one of this country's resources
    pub fn resource_path(&self, data_dir: &Path, kind: ResourceKind) -> PathBuf {
        self.data_dir(data_dir).join(kind.file_name(&self.slug()))
    }
}

/// Result of applying a country filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Countries to process, in canonical order
    pub countries: Vec<&'static Country>,
    /// Requested codes that were dropped because they are not supported
    pub rejected: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

/// Split a comma-separated filter such as `"khm, THA"` into uppercase codes
pub fn parse_country_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Resolve the set of countries to process.
///
/// `None` or an empty list selects every supported country. Unsupported or
/// malformed codes are dropped and reported in [`Selection::rejected`]; the
/// result always follows [`SUPPORTED_COUNTRIES`] order without duplicates.
pub fn select_countries(requested: Option<&[String]>) -> Selection {
    let requested = match requested {
        Some(codes) if !codes.is_empty() => codes,
        _ => {
            return Selection {
                countries: SUPPORTED_COUNTRIES.iter().collect(),
                rejected: Vec::new(),
            }
        },
    };

    let mut wanted = Vec::new();
    let mut rejected = Vec::new();

    for raw in requested {
        match raw.parse::<CountryCode>().ok().and_then(|code| Country::find(&code)) {
            Some(country) => wanted.push(country.iso3),
            None => {
                warn!(code = %raw, "Ignoring unsupported country code");
                rejected.push(raw.clone());
            },
        }
    }

    let countries = SUPPORTED_COUNTRIES
        .iter()
        .filter(|c| wanted.contains(&c.iso3))
        .collect();

    Selection { countries, rejected }
}
