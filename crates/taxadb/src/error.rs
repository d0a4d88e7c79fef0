//! Resolver error types
//!
//! A taxid or name that is absent from the store is not an error: lookups
//! return `Ok(None)`. The variants below cover setup failures, missing store
//! capabilities and corrupt parent chains.

use taxadb_common::TaxId;
use thiserror::Error;

/// Result type alias for resolver operations
pub type TaxonomyResult<T> = std::result::Result<T, TaxonomyError>;

#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// The taxa table is missing. Raised when the resolver is constructed.
    #[error("Taxon table '{0}' does not exist. Load the taxonomy before creating a resolver.")]
    MissingTable(String),

    /// The store cannot run the requested query (e.g. pg_trgm is not installed)
    #[error("Unsupported store feature: {0}")]
    UnsupportedFeature(String),

    /// A lineage walk reached a parent pointer whose row does not exist
    #[error("Taxon {taxid} references parent {parent_taxid}, which does not exist")]
    MissingParent { taxid: TaxId, parent_taxid: TaxId },

    /// A non-root taxon has no parent, or names itself as its parent
    #[error("Taxon {taxid} is not the root but has no usable parent")]
    OrphanTaxon { taxid: TaxId },

    /// The walk did not reach the root within the depth bound (cycle or corrupt data)
    #[error("Lineage of taxon {taxid} did not reach the root within {max_depth} steps")]
    LineageTooDeep { taxid: TaxId, max_depth: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TaxonomyError {
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature(feature.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for failures caused by inconsistent taxonomy rows
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::MissingParent { .. } | Self::OrphanTaxon { .. } | Self::LineageTooDeep { .. }
        )
    }
}
