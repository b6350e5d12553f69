//! Fixtures shared by the integration tests

#![allow(dead_code)]

use gem_common::types::ResourceFormat;
use gem_publisher::country::{Country, SUPPORTED_COUNTRIES};
use gem_publisher::dataset::ResourceKind;
use std::fs;
use std::path::Path;

/// Owner organisation in the embedded dataset template
pub const OWNER_ORG: &str = "372eabc7-d7b8-42a0-af47-52d9849edd02";

pub fn country(iso3: &str) -> &'static Country {
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.iso3 == iso3)
        .expect("supported country")
}

/// Write the nine files of a country under `data_dir`
pub fn write_country_files(data_dir: &Path, iso3: &str) {
    let country = country(iso3);
    for kind in ResourceKind::ALL {
        let path = country.resource_path(data_dir, kind);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create country dir");

        let contents = match kind.format() {
            ResourceFormat::Csv => format!(
                "iso3,country,year,value\n{iso},{name},2012,0.5\n{iso},{name},2022,0.4\n",
                iso = country.iso3,
                name = country.name
            ),
            ResourceFormat::GeoJson => {
                r#"{"type":"FeatureCollection","features":[]}"#.to_string()
            },
        };
        fs::write(&path, contents).expect("write resource file");
    }
}

/// `{"success": true, "result": ...}`
pub fn ok(result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "success": true, "result": result })
}

pub fn not_found() -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": { "message": "Not found", "__type": "Not Found Error" }
    })
}
