//! Taxadb Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and logging for the taxadb workspace.
//!
//! # Overview
//!
//! - **Types**: the [`Taxon`](types::Taxon) row and the
//!   [`FuzzyMatch`](types::FuzzyMatch) search hit returned by the resolver
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use taxadb_common::logging::{init_logging, LogConfig};
//! use taxadb_common::types::Taxon;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!
//!     let human = Taxon::new(9606, "Homo sapiens", Some(9605)).with_rank("species");
//!     tracing::info!(taxid = human.taxid, name = %human.name, "Loaded taxon");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{FuzzyMatch, TaxId, Taxon};
