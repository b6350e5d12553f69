//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod countries;
pub mod preview;
pub mod publish;

use crate::country::{parse_country_filter, select_countries, Selection};
use crate::error::{PublishError, Result};

/// Apply a raw `--countries` value.
///
/// A filter that names only unsupported codes is an error rather than a
/// silent no-op run.
pub fn resolve_selection(raw: Option<&str>) -> Result<Selection> {
    let requested = raw.map(parse_country_filter).unwrap_or_default();
    let selection = select_countries(Some(requested.as_slice()));

    if selection.is_empty() {
        return Err(PublishError::NoCountriesSelected(
            raw.unwrap_or_default().to_string(),
        ));
    }

    Ok(selection)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selection() {
        assert_eq!(resolve_selection(None).unwrap().countries.len(), 5);
        assert_eq!(resolve_selection(Some(" , ")).unwrap().countries.len(), 5);

        let selection = resolve_selection(Some("mmr,xyz")).unwrap();
        assert_eq!(selection.countries[0].iso3, "MMR");
        assert_eq!(selection.rejected, vec!["XYZ"]);
    }

    #[test]
    fn test_only_unsupported_codes_is_error() {
        let err = resolve_selection(Some("USA,FRA")).unwrap_err();
        assert!(matches!(err, PublishError::NoCountriesSelected(ref raw) if raw == "USA,FRA"));
        assert!(err.is_fatal());
    }
}
