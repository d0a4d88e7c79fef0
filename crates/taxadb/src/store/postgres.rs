//! Postgres taxon store
//!
//! Expects a table shaped like the one created by `migrations/`:
//!
//! ```sql
//! taxa(ncbi_taxid INTEGER PRIMARY KEY, parent_taxid INTEGER,
//!      tax_name TEXT NOT NULL, lineage_level VARCHAR)
//! ```
//!
//! Fuzzy search needs the `pg_trgm` (`%`, `similarity`) and `fuzzystrmatch`
//! (`levenshtein`) extensions. When they are missing the fuzzy query fails
//! with [`TaxonomyError::UnsupportedFeature`]; every other query still works.
//!
//! The table name is the only identifier interpolated into SQL. It is
//! validated when the store is created; all values are bound parameters.

use async_trait::async_trait;
use regex::Regex;
use sqlx::PgPool;
use taxadb_common::{FuzzyMatch, TaxId, Taxon};
use tracing::{debug, warn};

use super::{SimilarityQuery, TaxonStore};
use crate::error::{TaxonomyError, TaxonomyResult};

/// `table` or `schema.table`, unquoted
const TABLE_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$";

/// SQLSTATE for an undefined function or operator
const UNDEFINED_FUNCTION: &str = "42883";

const FUZZY_EXTENSIONS: [&str; 2] = ["pg_trgm", "fuzzystrmatch"];

#[derive(Debug, Clone)]
pub struct PgTaxonStore {
    pool: PgPool,
    table: String,
}

impl PgTaxonStore {
    /// Create a store over `table`. Does not touch the database.
    pub fn new(pool: PgPool, table: impl Into<String>) -> TaxonomyResult<Self> {
        let table = table.into();

        let pattern = Regex::new(TABLE_NAME_PATTERN)
            .map_err(|e| TaxonomyError::config(format!("Invalid table name pattern: {}", e)))?;
        if !pattern.is_match(&table) {
            return Err(TaxonomyError::config(format!(
                "Invalid taxa table name '{}': expected an unquoted identifier, optionally schema-qualified",
                table
            )));
        }

        Ok(Self { pool, table })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Extensions required by fuzzy search that are not installed
    pub async fn missing_fuzzy_extensions(&self) -> TaxonomyResult<Vec<String>> {
        let installed: Vec<String> =
            sqlx::query_scalar("SELECT extname::TEXT FROM pg_extension WHERE extname = ANY($1)")
                .bind(&FUZZY_EXTENSIONS[..])
                .fetch_all(&self.pool)
                .await?;

        Ok(FUZZY_EXTENSIONS
            .iter()
            .filter(|ext| !installed.iter().any(|name| name == *ext))
            .map(|ext| ext.to_string())
            .collect())
    }

    fn select_columns(&self) -> String {
        format!(
            "SELECT ncbi_taxid, parent_taxid, tax_name, lineage_level FROM {}",
            self.table
        )
    }
}

#[async_trait]
impl TaxonStore for PgTaxonStore {
    #[tracing::instrument(skip(self), fields(table = %self.table))]
    async fn check_table(&self) -> TaxonomyResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(&self.table)
            .fetch_one(&self.pool)
            .await?;

        if !exists {
            return Err(TaxonomyError::MissingTable(self.table.clone()));
        }

        let missing = self.missing_fuzzy_extensions().await?;
        if !missing.is_empty() {
            warn!(
                extensions = ?missing,
                "Fuzzy name search unavailable: required extensions are not installed"
            );
        }

        Ok(())
    }

    async fn taxon_by_id(&self, taxid: TaxId) -> TaxonomyResult<Option<Taxon>> {
        let sql = format!("{} WHERE ncbi_taxid = $1", self.select_columns());

        let row: Option<TaxonRow> = sqlx::query_as(&sql)
            .bind(taxid)
            .fetch_optional(&self.pool)
            .await?;

        debug!(taxid, found = row.is_some(), "Looked up taxon by id");
        Ok(row.map(Taxon::from))
    }

    async fn taxon_by_name(&self, name: &str) -> TaxonomyResult<Option<Taxon>> {
        let sql = format!(
            "{} WHERE tax_name = $1 ORDER BY ncbi_taxid LIMIT 1",
            self.select_columns()
        );

        let row: Option<TaxonRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        debug!(name, found = row.is_some(), "Looked up taxon by name");
        Ok(row.map(Taxon::from))
    }

    async fn similar_taxa(
        &self,
        name: &str,
        query: SimilarityQuery,
    ) -> TaxonomyResult<Vec<FuzzyMatch>> {
        // $1 is used three times: similarity score, edit distance and the % filter
        let sql = format!(
            r#"
            SELECT
                ncbi_taxid,
                parent_taxid,
                tax_name,
                lineage_level,
                similarity(tax_name, $1) AS similarity,
                levenshtein(tax_name, $1) AS edit_distance
            FROM {}
            WHERE tax_name % $1
            ORDER BY similarity DESC, ncbi_taxid
            LIMIT $2
            "#,
            self.table
        );

        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

        // The threshold of % is a session setting; scope it to this transaction
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('pg_trgm.similarity_threshold', $1, true)")
            .bind(query.threshold.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_fuzzy_error)?;

        let rows: Vec<FuzzyRow> = sqlx::query_as(&sql)
            .bind(name)
            .bind(limit)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_fuzzy_error)?;

        tx.commit().await?;

        debug!(name, hits = rows.len(), "Fuzzy name search");
        Ok(rows.into_iter().map(FuzzyMatch::from).collect())
    }

    async fn ancestor_chain(
        &self,
        taxid: TaxId,
        root_name: &str,
        max_depth: usize,
    ) -> TaxonomyResult<Vec<Taxon>> {
        let sql = format!(
            r#"
            WITH RECURSIVE chain AS (
                SELECT ncbi_taxid, parent_taxid, tax_name, lineage_level, 0 AS depth
                FROM {table}
                WHERE ncbi_taxid = $1

                UNION ALL

                SELECT t.ncbi_taxid, t.parent_taxid, t.tax_name, t.lineage_level, c.depth + 1
                FROM chain c
                JOIN {table} t ON t.ncbi_taxid = c.parent_taxid
                WHERE c.tax_name <> $2
                  AND c.depth < $3
            )
            SELECT ncbi_taxid, parent_taxid, tax_name, lineage_level
            FROM chain
            ORDER BY depth
            "#,
            table = self.table
        );

        let max_depth = i32::try_from(max_depth).unwrap_or(i32::MAX);

        let rows: Vec<TaxonRow> = sqlx::query_as(&sql)
            .bind(taxid)
            .bind(root_name)
            .bind(max_depth)
            .fetch_all(&self.pool)
            .await?;

        debug!(taxid, rows = rows.len(), "Fetched ancestor chain");
        Ok(rows.into_iter().map(Taxon::from).collect())
    }
}

fn map_fuzzy_error(err: sqlx::Error) -> TaxonomyError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNDEFINED_FUNCTION) {
            warn!(error = %db_err, "Trigram or edit-distance function missing");
            return TaxonomyError::unsupported(format!(
                "fuzzy name search requires the pg_trgm and fuzzystrmatch extensions ({})",
                db_err.message()
            ));
        }
    }
    TaxonomyError::Database(err)
}

#[derive(Debug, sqlx::FromRow)]
struct TaxonRow {
    ncbi_taxid: i32,
    parent_taxid: Option<i32>,
    tax_name: String,
    lineage_level: Option<String>,
}

impl From<TaxonRow> for Taxon {
    fn from(row: TaxonRow) -> Self {
        Taxon {
            taxid: row.ncbi_taxid,
            name: row.tax_name,
            parent_taxid: row.parent_taxid,
            rank: row.lineage_level,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FuzzyRow {
    #[sqlx(flatten)]
    taxon: TaxonRow,
    similarity: f32,
    edit_distance: i32,
}

impl From<FuzzyRow> for FuzzyMatch {
    fn from(row: FuzzyRow) -> Self {
        FuzzyMatch {
            taxon: row.taxon.into(),
            similarity: row.similarity,
            edit_distance: row.edit_distance,
        }
    }
}
