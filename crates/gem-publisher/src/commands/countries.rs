//! `adpc-gem countries` command implementation
//!
//! Lists the supported countries and how many of their files are on disk.

use crate::country::{Country, SUPPORTED_COUNTRIES};
use crate::dataset::{ResourceKind, RESOURCE_COUNT};
use crate::error::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::path::Path;

/// Run the countries command
pub async fn run(data_dir: &Path, name_suffix: &str) -> Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Code", "Country", "Dataset", "Files"]);

    for country in SUPPORTED_COUNTRIES.iter() {
        let present = files_present(country, data_dir);
        table.add_row(vec![
            country.iso3.to_string(),
            country.name.to_string(),
            format!("{}-{}", country.slug(), name_suffix),
            format!("{}/{}", present, RESOURCE_COUNT),
        ]);
    }

    println!("{}", format!("Data directory: {}", data_dir.display()).cyan());
    println!("{table}");
    Ok(())
}

/// How many of the country's files exist under `data_dir`
pub fn files_present(country: &Country, data_dir: &Path) -> usize {
    ResourceKind::ALL
        .into_iter()
        .filter(|kind| country.resource_path(data_dir, *kind).is_file())
        .count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_helpers::{khm, tha, write_country_files};
    use tempfile::TempDir;

    #[test]
    fn test_files_present() {
        let dir = TempDir::new().unwrap();
        write_country_files(dir.path(), khm());
        std::fs::remove_file(khm().resource_path(dir.path(), ResourceKind::GiiNational)).unwrap();

        assert_eq!(files_present(khm(), dir.path()), 8);
        assert_eq!(files_present(tha(), dir.path()), 0);
    }
}
