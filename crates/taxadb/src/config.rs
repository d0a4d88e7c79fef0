//! Configuration management

use serde::{Deserialize, Serialize};

use crate::db::DbConfig;
use crate::error::{TaxonomyError, TaxonomyResult};

// ============================================================================
// Resolver Configuration Constants
// ============================================================================

/// Default taxa table name.
pub const DEFAULT_TABLE: &str = "taxa";

/// Name of the NCBI root node. Lineage walks stop at the row carrying this name.
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Default number of fuzzy search hits.
pub const DEFAULT_FUZZY_LIMIT: usize = 10;

/// Default trigram similarity cutoff (same as `pg_trgm.similarity_threshold`).
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Default bound on parent hops before a walk is treated as corrupt.
/// NCBI lineages are well under 100 levels deep.
pub const DEFAULT_MAX_LINEAGE_DEPTH: usize = 256;

/// Largest accepted depth bound.
pub const MAX_LINEAGE_DEPTH_LIMIT: usize = 10_000;

/// How lineage walks fetch ancestors from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineageStrategy {
    /// One point lookup per ancestor level
    #[default]
    Iterative,
    /// One recursive query for the whole chain
    Recursive,
}

impl std::str::FromStr for LineageStrategy {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iterative" => Ok(LineageStrategy::Iterative),
            "recursive" | "cte" => Ok(LineageStrategy::Recursive),
            _ => Err(TaxonomyError::config(format!("Invalid lineage strategy: {}", s))),
        }
    }
}

/// Resolver behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Taxa table, optionally schema-qualified (`public.taxa`)
    pub table: String,

    /// Name identifying the root taxon
    pub root_name: String,

    /// Limit applied when a fuzzy search does not specify one
    pub default_fuzzy_limit: usize,

    /// Minimum trigram similarity for a fuzzy candidate, in `(0, 1]`
    pub similarity_threshold: f32,

    pub max_lineage_depth: usize,

    pub lineage_strategy: LineageStrategy,

    /// Put the queried taxon at the head of its own lineage
    pub include_queried_taxon: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            default_fuzzy_limit: DEFAULT_FUZZY_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_lineage_depth: DEFAULT_MAX_LINEAGE_DEPTH,
            lineage_strategy: LineageStrategy::Iterative,
            include_queried_taxon: false,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load resolver settings from `TAXADB_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable values are errors.
    pub fn from_env() -> TaxonomyResult<Self> {
        let mut config = Self::default();

        if let Ok(table) = std::env::var("TAXADB_TABLE") {
            config.table = table;
        }
        if let Ok(root) = std::env::var("TAXADB_ROOT_NAME") {
            config.root_name = root;
        }
        if let Some(limit) = parse_env("TAXADB_FUZZY_LIMIT")? {
            config.default_fuzzy_limit = limit;
        }
        if let Some(threshold) = parse_env("TAXADB_SIMILARITY_THRESHOLD")? {
            config.similarity_threshold = threshold;
        }
        if let Some(depth) = parse_env("TAXADB_MAX_LINEAGE_DEPTH")? {
            config.max_lineage_depth = depth;
        }
        if let Some(strategy) = parse_env("TAXADB_LINEAGE_STRATEGY")? {
            config.lineage_strategy = strategy;
        }
        if let Some(include) = parse_env("TAXADB_INCLUDE_QUERIED_TAXON")? {
            config.include_queried_taxon = include;
        }

        Ok(config)
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    pub fn with_default_fuzzy_limit(mut self, limit: usize) -> Self {
        self.default_fuzzy_limit = limit;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_max_lineage_depth(mut self, depth: usize) -> Self {
        self.max_lineage_depth = depth;
        self
    }

    pub fn with_lineage_strategy(mut self, strategy: LineageStrategy) -> Self {
        self.lineage_strategy = strategy;
        self
    }

    pub fn with_queried_taxon(mut self, include: bool) -> Self {
        self.include_queried_taxon = include;
        self
    }

    pub fn validate(&self) -> TaxonomyResult<()> {
        if self.table.trim().is_empty() {
            return Err(TaxonomyError::config("Taxa table name cannot be empty"));
        }

        if self.root_name.is_empty() {
            return Err(TaxonomyError::config("Root name cannot be empty"));
        }

        if self.default_fuzzy_limit == 0 {
            return Err(TaxonomyError::config("Default fuzzy limit must be greater than 0"));
        }

        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(TaxonomyError::config(format!(
                "Similarity threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.max_lineage_depth == 0 {
            return Err(TaxonomyError::config("Max lineage depth must be greater than 0"));
        }

        if self.max_lineage_depth > MAX_LINEAGE_DEPTH_LIMIT {
            return Err(TaxonomyError::config(format!(
                "Max lineage depth cannot exceed {}, got {}",
                MAX_LINEAGE_DEPTH_LIMIT, self.max_lineage_depth
            )));
        }

        Ok(())
    }
}

/// Complete configuration: database connection plus resolver behaviour
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DbConfig,
    pub resolver: ResolverConfig,
}

impl Config {
    /// Load configuration from `.env` (if present) and the environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DbConfig::from_env()?,
            resolver: ResolverConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        self.resolver.validate()?;

        Ok(())
    }
}

fn parse_env<T>(key: &str) -> TaxonomyResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| TaxonomyError::config(format!("{} has invalid value '{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
