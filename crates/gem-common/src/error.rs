//! Error types shared across the GEM workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, GemError>;

/// Main error type for shared GEM types
#[derive(Error, Debug)]
pub enum GemError {
    #[error("Invalid ISO3 country code: '{0}' (expected three letters, e.g. KHM)")]
    InvalidCountryCode(String),
}
