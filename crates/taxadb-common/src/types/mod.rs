//! Taxonomy domain types shared across crates

use serde::{Deserialize, Serialize};

/// NCBI Taxonomy identifier (e.g. 9606 for Homo sapiens)
pub type TaxId = i32;

/// One node of the taxonomy tree, as stored in the taxa table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taxon {
    /// NCBI Taxonomy ID
    pub taxid: TaxId,

    /// Scientific name (e.g., "Homo sapiens")
    pub name: String,

    /// Parent taxid. The root either points at itself or has no parent.
    pub parent_taxid: Option<TaxId>,

    /// Taxonomic rank (e.g., "species", "genus"), when the loader recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
}

impl Taxon {
    /// Create a taxon without rank information
    pub fn new(taxid: TaxId, name: impl Into<String>, parent_taxid: Option<TaxId>) -> Self {
        Self {
            taxid,
            name: name.into(),
            parent_taxid,
            rank: None,
        }
    }

    /// Attach a taxonomic rank
    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    /// Whether this row is the root of its taxonomy, identified by name.
    pub fn is_root(&self, root_name: &str) -> bool {
        self.name == root_name
    }
}

/// A fuzzy name search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    /// The matched row
    #[serde(flatten)]
    pub taxon: Taxon,

    /// Trigram similarity between the query and the taxon name, in `[0, 1]`
    pub similarity: f32,

    /// Levenshtein distance between the query and the taxon name
    pub edit_distance: i32,
}

impl FuzzyMatch {
    pub fn taxid(&self) -> TaxId {
        self.taxon.taxid
    }

    pub fn name(&self) -> &str {
        &self.taxon.name
    }

    /// Whether the stored name equals the query exactly
    pub fn is_exact(&self) -> bool {
        self.edit_distance == 0
    }
}
