//! Fixtures shared by unit tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::country::{Country, SUPPORTED_COUNTRIES};
use crate::dataset::ResourceKind;
use gem_common::types::ResourceFormat;
use std::path::Path;

pub fn khm() -> &'static Country {
    &SUPPORTED_COUNTRIES[0]
}

pub fn tha() -> &'static Country {
    &SUPPORTED_COUNTRIES[3]
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Write all nine files for a country with small but valid contents
pub fn write_country_files(data_dir: &Path, country: &Country) {
    for kind in ResourceKind::ALL {
        let contents = match kind.format() {
            ResourceFormat::Csv => format!(
                "iso3,country,year,value\n{iso},{name},2015,0.41\n{iso},{name},2020,0.38\n",
                iso = country.iso3,
                name = country.name
            ),
            ResourceFormat::GeoJson => format!(
                r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"iso":"{}"}},"geometry":null}}]}}"#,
                country.iso3
            ),
        };
        write_file(&country.resource_path(data_dir, kind), &contents);
    }
}
