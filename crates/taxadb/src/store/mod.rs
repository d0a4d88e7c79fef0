//! Taxon Store abstraction
//!
//! The resolver only needs a handful of read queries from whatever holds the
//! taxa rows. [`PgTaxonStore`] runs them against Postgres; [`MemoryTaxonStore`]
//! answers them from an in-process map.

use async_trait::async_trait;
use taxadb_common::{FuzzyMatch, TaxId, Taxon};

use crate::error::{TaxonomyError, TaxonomyResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryTaxonStore;
pub use postgres::PgTaxonStore;

/// Parameters of a trigram similarity search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityQuery {
    /// Minimum similarity for a row to be a candidate
    pub threshold: f32,
    /// Maximum number of rows returned
    pub limit: usize,
}

#[async_trait]
pub trait TaxonStore: Send + Sync {
    /// Fails with [`TaxonomyError::MissingTable`] when the taxa table is absent
    async fn check_table(&self) -> TaxonomyResult<()>;

    async fn taxon_by_id(&self, taxid: TaxId) -> TaxonomyResult<Option<Taxon>>;

    /// Exact name match. When several rows share the name, the lowest taxid wins.
    async fn taxon_by_name(&self, name: &str) -> TaxonomyResult<Option<Taxon>>;

    /// Rows whose name clears `query.threshold`, most similar first (ties by
    /// ascending taxid), at most `query.limit` of them
    async fn similar_taxa(
        &self,
        name: &str,
        query: SimilarityQuery,
    ) -> TaxonomyResult<Vec<FuzzyMatch>>;

    /// Fetch the parent chain of `taxid` in one round-trip.
    ///
    /// The result starts with `taxid` itself (empty if it does not exist) and
    /// follows parent pointers until a row named `root_name` has been included,
    /// a parent is missing, or `max_depth` hops have been taken. Callers
    /// validate the links.
    async fn ancestor_chain(
        &self,
        taxid: TaxId,
        root_name: &str,
        max_depth: usize,
    ) -> TaxonomyResult<Vec<Taxon>> {
        let _ = (taxid, root_name, max_depth);
        Err(TaxonomyError::unsupported("recursive ancestor queries"))
    }
}
