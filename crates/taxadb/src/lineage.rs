//! Ancestor walk
//!
//! [`LineageWalk`] holds the state of one walk from a queried taxon up to the
//! root. The resolver feeds it parent rows one at a time, whether they come
//! from individual point lookups or from a prefetched recursive chain, so both
//! strategies share the same termination and integrity rules:
//!
//! - the walk ends on the first row whose name is the root name
//! - the root is never part of the lineage
//! - the queried taxon is part of it only when `include_queried` is set
//! - a non-root row without a parent (or pointing at itself), a missing parent
//!   row, or more than `max_depth` hops fail the whole walk

use taxadb_common::{TaxId, Taxon};
use tracing::warn;

use crate::error::{TaxonomyError, TaxonomyResult};

pub(crate) struct LineageWalk<'a> {
    root_name: &'a str,
    max_depth: usize,
    include_queried: bool,
    queried: TaxId,
    current: Taxon,
    hops: usize,
    lineage: Vec<Taxon>,
}

impl<'a> LineageWalk<'a> {
    pub(crate) fn start(
        queried: Taxon,
        root_name: &'a str,
        max_depth: usize,
        include_queried: bool,
    ) -> Self {
        Self {
            root_name,
            max_depth,
            include_queried,
            queried: queried.taxid,
            current: queried,
            hops: 0,
            lineage: Vec::new(),
        }
    }

    /// The parent to fetch next, or `None` once the root has been reached
    pub(crate) fn next_parent(&self) -> TaxonomyResult<Option<TaxId>> {
        if self.current.is_root(self.root_name) {
            return Ok(None);
        }

        match self.current.parent_taxid {
            Some(parent) if parent != self.current.taxid => Ok(Some(parent)),
            _ => {
                warn!(
                    taxid = self.current.taxid,
                    queried = self.queried,
                    "Non-root taxon without a parent"
                );
                Err(TaxonomyError::OrphanTaxon {
                    taxid: self.current.taxid,
                })
            },
        }
    }

    /// Move to the parent row returned for [`next_parent`](Self::next_parent)
    pub(crate) fn advance(&mut self, parent: Taxon) -> TaxonomyResult<()> {
        self.hops += 1;
        if self.hops > self.max_depth {
            warn!(
                taxid = self.queried,
                max_depth = self.max_depth,
                "Lineage walk exceeded depth bound"
            );
            return Err(TaxonomyError::LineageTooDeep {
                taxid: self.queried,
                max_depth: self.max_depth,
            });
        }

        let child = std::mem::replace(&mut self.current, parent);
        if self.hops > 1 || self.include_queried {
            self.lineage.push(child);
        }

        Ok(())
    }

    /// Error for a parent pointer whose row does not exist
    pub(crate) fn missing_parent(&self, parent_taxid: TaxId) -> TaxonomyError {
        warn!(
            taxid = self.current.taxid,
            parent_taxid,
            queried = self.queried,
            "Lineage walk hit a dangling parent pointer"
        );
        TaxonomyError::MissingParent {
            taxid: self.current.taxid,
            parent_taxid,
        }
    }

    /// Closest ancestor first, or most distant first when `reverse` is set
    pub(crate) fn finish(self, reverse: bool) -> Vec<Taxon> {
        let mut lineage = self.lineage;
        if reverse {
            lineage.reverse();
        }
        lineage
    }
}
