//! In-process taxon store
//!
//! Holds the taxa in a `BTreeMap` keyed by taxid, with a name index for exact
//! lookups. Fuzzy search scores every name with [`crate::similarity`] and
//! `strsim::levenshtein`, mirroring what `pg_trgm` and `fuzzystrmatch`
//! compute in Postgres.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use taxadb_common::{FuzzyMatch, TaxId, Taxon};

use super::{SimilarityQuery, TaxonStore};
use crate::error::TaxonomyResult;
use crate::similarity::similarity;

#[derive(Debug, Clone, Default)]
pub struct MemoryTaxonStore {
    taxa: BTreeMap<TaxId, Taxon>,
    by_name: HashMap<String, BTreeSet<TaxId>>,
}

impl MemoryTaxonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a taxon, returning the row it replaced
    pub fn insert(&mut self, taxon: Taxon) -> Option<Taxon> {
        let replaced = self.taxa.insert(taxon.taxid, taxon.clone());

        if let Some(ref old) = replaced {
            if let Some(ids) = self.by_name.get_mut(&old.name) {
                ids.remove(&old.taxid);
                if ids.is_empty() {
                    self.by_name.remove(&old.name);
                }
            }
        }

        self.by_name.entry(taxon.name).or_default().insert(taxon.taxid);

        replaced
    }

    pub fn get(&self, taxid: TaxId) -> Option<&Taxon> {
        self.taxa.get(&taxid)
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }
}

impl FromIterator<Taxon> for MemoryTaxonStore {
    fn from_iter<I: IntoIterator<Item = Taxon>>(iter: I) -> Self {
        let mut store = Self::new();
        for taxon in iter {
            store.insert(taxon);
        }
        store
    }
}

#[async_trait]
impl TaxonStore for MemoryTaxonStore {
    async fn check_table(&self) -> TaxonomyResult<()> {
        Ok(())
    }

    async fn taxon_by_id(&self, taxid: TaxId) -> TaxonomyResult<Option<Taxon>> {
        Ok(self.taxa.get(&taxid).cloned())
    }

    async fn taxon_by_name(&self, name: &str) -> TaxonomyResult<Option<Taxon>> {
        Ok(self
            .by_name
            .get(name)
            .and_then(|ids| ids.first())
            .and_then(|taxid| self.taxa.get(taxid))
            .cloned())
    }

    async fn similar_taxa(
        &self,
        name: &str,
        query: SimilarityQuery,
    ) -> TaxonomyResult<Vec<FuzzyMatch>> {
        let mut matches: Vec<FuzzyMatch> = self
            .taxa
            .values()
            .filter_map(|taxon| {
                let score = similarity(&taxon.name, name);
                (score >= query.threshold).then(|| FuzzyMatch {
                    taxon: taxon.clone(),
                    similarity: score,
                    edit_distance: i32::try_from(strsim::levenshtein(&taxon.name, name))
                        .unwrap_or(i32::MAX),
                })
            })
            .collect();

        // Sort by similarity descending; BTreeMap iteration already ordered ties by taxid
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(query.limit);

        Ok(matches)
    }

    async fn ancestor_chain(
        &self,
        taxid: TaxId,
        root_name: &str,
        max_depth: usize,
    ) -> TaxonomyResult<Vec<Taxon>> {
        let mut chain = Vec::new();
        let mut next = Some(taxid);

        while let Some(id) = next {
            let Some(taxon) = self.taxa.get(&id) else {
                break;
            };
            chain.push(taxon.clone());

            if taxon.is_root(root_name) || chain.len() > max_depth {
                break;
            }
            next = taxon.parent_taxid;
        }

        Ok(chain)
    }
}
