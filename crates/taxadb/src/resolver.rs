//! Taxonomy resolver
//!
//! Maps taxids to scientific names and back, searches names approximately and
//! walks parent pointers up to the root. A taxid or name that is not in the
//! store yields `Ok(None)` (or an empty list for fuzzy search); `Err` means the
//! store failed, lacks a capability, or holds an inconsistent parent chain.
//!
//! # Example
//!
//! ```
//! use taxadb::{MemoryTaxonStore, ResolverConfig, Taxon, TaxonomyResolver};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> taxadb::TaxonomyResult<()> {
//! let store: MemoryTaxonStore = [
//!     Taxon::new(1, "root", Some(1)),
//!     Taxon::new(2, "Eukaryota", Some(1)),
//!     Taxon::new(3, "Homo sapiens", Some(2)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let resolver = TaxonomyResolver::new(store, ResolverConfig::default()).await?;
//!
//! assert_eq!(resolver.lineage_names(3, false).await?, Some(vec!["Eukaryota".to_string()]));
//! assert_eq!(resolver.taxid_for_name("Pan troglodytes").await?, None);
//! # Ok(())
//! # }
//! ```

use taxadb_common::{FuzzyMatch, TaxId, Taxon};
use tracing::{debug, info};

use crate::config::{LineageStrategy, ResolverConfig};
use crate::error::TaxonomyResult;
use crate::lineage::LineageWalk;
use crate::store::{SimilarityQuery, TaxonStore};

/// Stateless lookups over a [`TaxonStore`]
#[derive(Debug)]
pub struct TaxonomyResolver<S> {
    store: S,
    config: ResolverConfig,
}

impl<S: TaxonStore> TaxonomyResolver<S> {
    /// Validate `config` and make sure the taxa table exists.
    ///
    /// A missing table is reported here as [`TaxonomyError::MissingTable`],
    /// never later at query time.
    ///
    /// [`TaxonomyError::MissingTable`]: crate::TaxonomyError::MissingTable
    pub async fn new(store: S, config: ResolverConfig) -> TaxonomyResult<Self> {
        config.validate()?;
        store.check_table().await?;

        info!(
            root_name = %config.root_name,
            strategy = ?config.lineage_strategy,
            "Taxonomy resolver ready"
        );

        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Full row for `taxid`
    #[tracing::instrument(skip(self))]
    pub async fn taxon(&self, taxid: TaxId) -> TaxonomyResult<Option<Taxon>> {
        self.store.taxon_by_id(taxid).await
    }

    /// Scientific name of `taxid`
    #[tracing::instrument(skip(self))]
    pub async fn name_for_taxid(&self, taxid: TaxId) -> TaxonomyResult<Option<String>> {
        Ok(self.store.taxon_by_id(taxid).await?.map(|taxon| taxon.name))
    }

    /// Taxid whose name equals `name` exactly; the lowest taxid when several do
    #[tracing::instrument(skip(self))]
    pub async fn taxid_for_name(&self, name: &str) -> TaxonomyResult<Option<TaxId>> {
        Ok(self.store.taxon_by_name(name).await?.map(|taxon| taxon.taxid))
    }

    /// Approximate name search.
    ///
    /// Only names whose trigram similarity to `name` reaches the configured
    /// threshold are returned, most similar first, at most `limit` of them
    /// (the configured default when `None`). Fails with
    /// [`TaxonomyError::UnsupportedFeature`](crate::TaxonomyError::UnsupportedFeature)
    /// when the store cannot compute similarity.
    #[tracing::instrument(skip(self))]
    pub async fn fuzzy_taxids_for_name(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> TaxonomyResult<Vec<FuzzyMatch>> {
        let limit = limit.unwrap_or(self.config.default_fuzzy_limit);
        if limit == 0 || name.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = SimilarityQuery {
            threshold: self.config.similarity_threshold,
            limit,
        };

        let matches = self.store.similar_taxa(name, query).await?;
        debug!(hits = matches.len(), "Fuzzy search complete");
        Ok(matches)
    }

    /// Ancestors of `taxid` up to, not including, the root.
    ///
    /// Closest ancestor first; most distant first when `reverse` is set.
    /// `None` when `taxid` does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn lineage(&self, taxid: TaxId, reverse: bool) -> TaxonomyResult<Option<Vec<Taxon>>> {
        let walk = match self.config.lineage_strategy {
            LineageStrategy::Iterative => self.walk_iteratively(taxid).await?,
            LineageStrategy::Recursive => self.walk_prefetched(taxid).await?,
        };

        Ok(walk.map(|walk| walk.finish(reverse)))
    }

    /// Taxids of the ancestors of `taxid`, see [`lineage`](Self::lineage)
    pub async fn lineage_ids(&self, taxid: TaxId, reverse: bool) -> TaxonomyResult<Option<Vec<TaxId>>> {
        Ok(self
            .lineage(taxid, reverse)
            .await?
            .map(|lineage| lineage.into_iter().map(|taxon| taxon.taxid).collect()))
    }

    /// Names of the ancestors of `taxid`, see [`lineage`](Self::lineage)
    pub async fn lineage_names(
        &self,
        taxid: TaxId,
        reverse: bool,
    ) -> TaxonomyResult<Option<Vec<String>>> {
        Ok(self
            .lineage(taxid, reverse)
            .await?
            .map(|lineage| lineage.into_iter().map(|taxon| taxon.name).collect()))
    }

    fn begin_walk(&self, queried: Taxon) -> LineageWalk<'_> {
        LineageWalk::start(
            queried,
            &self.config.root_name,
            self.config.max_lineage_depth,
            self.config.include_queried_taxon,
        )
    }

    /// One point lookup per ancestor
    async fn walk_iteratively(&self, taxid: TaxId) -> TaxonomyResult<Option<LineageWalk<'_>>> {
        let Some(start) = self.store.taxon_by_id(taxid).await? else {
            return Ok(None);
        };

        let mut walk = self.begin_walk(start);
        while let Some(parent_taxid) = walk.next_parent()? {
            let parent = self
                .store
                .taxon_by_id(parent_taxid)
                .await?
                .ok_or_else(|| walk.missing_parent(parent_taxid))?;
            walk.advance(parent)?;
        }

        Ok(Some(walk))
    }

    /// One recursive query, then the same link-by-link walk over its rows
    async fn walk_prefetched(&self, taxid: TaxId) -> TaxonomyResult<Option<LineageWalk<'_>>> {
        // One hop past the bound so an over-long chain trips the walk's own check
        let fetch_depth = self.config.max_lineage_depth.saturating_add(1);
        let chain = self
            .store
            .ancestor_chain(taxid, &self.config.root_name, fetch_depth)
            .await?;

        let mut rows = chain.into_iter();
        let Some(start) = rows.next() else {
            return Ok(None);
        };

        let mut walk = self.begin_walk(start);
        while let Some(parent_taxid) = walk.next_parent()? {
            match rows.next() {
                Some(parent) if parent.taxid == parent_taxid => walk.advance(parent)?,
                _ => return Err(walk.missing_parent(parent_taxid)),
            }
        }

        Ok(Some(walk))
    }
}
