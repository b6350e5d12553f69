//! ADPC GEM Common Library
//!
//! Shared types, logging and error handling for the ADPC Gender Equality
//! Monitor publishing workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`GemError`] and the [`Result`] alias
//! - **Types**: [`types::CountryCode`] and [`types::ResourceFormat`]
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use gem_common::types::CountryCode;
//!
//! fn slug_for(code: &str) -> gem_common::Result<String> {
//!     let code: CountryCode = code.parse()?;
//!     Ok(code.slug())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{GemError, Result};
