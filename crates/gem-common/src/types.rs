//! Common types used across the GEM workspace

use crate::error::{GemError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ISO 3166-1 alpha-3 country code, always stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// The uppercase code, e.g. `KHM`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used in HDX dataset names, groups and file names
    pub fn slug(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl FromStr for CountryCode {
    type Err = GemError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GemError::InvalidCountryCode(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for CountryCode {
    type Error = GemError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// File format of a dataset resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceFormat {
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "GeoJSON")]
    GeoJson,
}

impl ResourceFormat {
    /// Label HDX expects in the resource `format` field
    pub fn hdx_label(self) -> &'static str {
        match self {
            ResourceFormat::Csv => "csv",
            ResourceFormat::GeoJson => "GeoJSON",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ResourceFormat::Csv => "csv",
            ResourceFormat::GeoJson => "geojson",
        }
    }
}

impl std::fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hdx_label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalizes_case_and_whitespace() {
        let code: CountryCode = " khm ".parse().unwrap();
        assert_eq!(code.as_str(), "KHM");
        assert_eq!(code.slug(), "khm");
        assert_eq!(code.to_string(), "KHM");
    }

    #[test]
    fn test_country_code_rejects_malformed_input() {
        assert!("KH".parse::<CountryCode>().is_err());
        assert!("KHMR".parse::<CountryCode>().is_err());
        assert!("K1M".parse::<CountryCode>().is_err());
        assert!("".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_country_code_serde() {
        let code: CountryCode = serde_json::from_str("\"tha\"").unwrap();
        assert_eq!(code.as_str(), "THA");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"THA\"");
        assert!(serde_json::from_str::<CountryCode>("\"Thailand\"").is_err());
    }

    #[test]
    fn test_resource_format_labels() {
        assert_eq!(ResourceFormat::Csv.hdx_label(), "csv");
        assert_eq!(ResourceFormat::GeoJson.hdx_label(), "GeoJSON");
        assert_eq!(ResourceFormat::GeoJson.extension(), "geojson");
        assert_eq!(
            serde_json::to_string(&ResourceFormat::GeoJson).unwrap(),
            "\"GeoJSON\""
        );
    }
}
