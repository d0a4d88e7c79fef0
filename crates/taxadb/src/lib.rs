//! Taxadb
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Resolve NCBI taxonomy identifiers against a relational taxa table.
//!
//! # Overview
//!
//! - **Point lookups**: taxid → scientific name and name → taxid
//! - **Fuzzy search**: trigram similarity (`pg_trgm`) ranked name matches with
//!   their edit distance (`fuzzystrmatch`)
//! - **Lineages**: the ancestor chain of a taxon, bottom-up or top-down,
//!   excluding the root
//!
//! The [`TaxonomyResolver`] is a stateless facade over a [`TaxonStore`]:
//! [`PgTaxonStore`] for Postgres, [`MemoryTaxonStore`] for embedded or test
//! taxonomies. The taxa rows are loaded by an external process; this crate
//! only reads them.
//!
//! # Example
//!
//! ```no_run
//! use taxadb::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let resolver = taxadb::open(&config).await?;
//!
//!     if let Some(lineage) = resolver.lineage_names(9606, true).await? {
//!         tracing::info!(lineage = %lineage.join("; "), "Homo sapiens");
//!     }
//!
//!     for hit in resolver.fuzzy_taxids_for_name("Homo sapien", Some(3)).await? {
//!         tracing::info!(taxid = hit.taxid(), name = hit.name(), similarity = hit.similarity, "match");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
mod lineage;
pub mod resolver;
pub mod similarity;
pub mod store;

// Re-export commonly used types
pub use config::{Config, LineageStrategy, ResolverConfig};
pub use error::{TaxonomyError, TaxonomyResult};
pub use resolver::TaxonomyResolver;
pub use store::{MemoryTaxonStore, PgTaxonStore, SimilarityQuery, TaxonStore};
pub use taxadb_common::{FuzzyMatch, TaxId, Taxon};

/// Connect to Postgres and build a resolver over the configured taxa table
pub async fn open(config: &Config) -> TaxonomyResult<TaxonomyResolver<PgTaxonStore>> {
    let pool = db::create_pool(&config.database).await?;
    db::health_check(&pool).await?;

    let store = PgTaxonStore::new(pool, config.resolver.table.clone())?;
    TaxonomyResolver::new(store, config.resolver.clone()).await
}
