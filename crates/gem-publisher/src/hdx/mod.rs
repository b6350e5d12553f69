//! HDX (CKAN) API access
//!
//! [`DatasetRepository`] is the seam the publisher talks to. [`HdxClient`]
//! implements it against the live action API; [`InMemoryRepository`] backs
//! dry runs and tests.

pub mod client;
pub mod endpoints;
pub mod memory;
pub mod repository;
pub mod types;

pub use client::HdxClient;
pub use memory::InMemoryRepository;
pub use repository::{DatasetRepository, RunStamp, UpsertAction, UpsertOutcome, UPDATED_BY_SCRIPT};
pub use types::*;
