//! Postgres test container for resolver integration tests
//!
//! Each test gets its own container, so tests can create, drop and seed the
//! taxa table freely.
//!
//! ```no_run
//! mod common;
//! use common::TestPostgres;
//!
//! #[tokio::test]
//! async fn test_with_postgres() {
//!     let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
//!     sqlx::query("SELECT 1").execute(pg.pool()).await.expect("Query failed");
//! }
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use taxadb::Taxon;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

/// Alpine images ship the contrib extensions (pg_trgm, fuzzystrmatch)
const POSTGRES_TAG: &str = "16-alpine";

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    /// Start a container with the taxa migration applied
    pub async fn start() -> Result<Self> {
        let pg = Self::start_empty().await?;
        sqlx::migrate!("../../migrations")
            .run(&pg.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(pg)
    }

    /// Start a container with no schema at all
    pub async fn start_empty() -> Result<Self> {
        let container = Postgres::default()
            .with_tag(POSTGRES_TAG)
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn pool_clone(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Insert rows into the `taxa` table
    pub async fn seed(&self, taxa: &[Taxon]) -> Result<()> {
        for taxon in taxa {
            sqlx::query(
                r#"
                INSERT INTO taxa (ncbi_taxid, parent_taxid, tax_name, lineage_level)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(taxon.taxid)
            .bind(taxon.parent_taxid)
            .bind(&taxon.name)
            .bind(taxon.rank.as_deref())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert taxon {}", taxon.taxid))?;
        }
        Ok(())
    }
}

/// The minimal tree from the resolver documentation
pub fn scenario_taxa() -> Vec<Taxon> {
    vec![
        Taxon::new(1, "root", Some(1)).with_rank("no rank"),
        Taxon::new(2, "Eukaryota", Some(1)).with_rank("superkingdom"),
        Taxon::new(3, "Homo sapiens", Some(2)).with_rank("species"),
    ]
}

/// A slice of the real NCBI tree around Homo sapiens, plus a typo'd name
pub fn primate_taxa() -> Vec<Taxon> {
    vec![
        Taxon::new(1, "root", Some(1)).with_rank("no rank"),
        Taxon::new(131567, "cellular organisms", Some(1)).with_rank("no rank"),
        Taxon::new(2759, "Eukaryota", Some(131567)).with_rank("superkingdom"),
        Taxon::new(33208, "Metazoa", Some(2759)).with_rank("kingdom"),
        Taxon::new(7711, "Chordata", Some(33208)).with_rank("phylum"),
        Taxon::new(40674, "Mammalia", Some(7711)).with_rank("class"),
        Taxon::new(9443, "Primates", Some(40674)).with_rank("order"),
        Taxon::new(9604, "Hominidae", Some(9443)).with_rank("family"),
        Taxon::new(9605, "Homo", Some(9604)).with_rank("genus"),
        Taxon::new(9606, "Homo sapiens", Some(9605)).with_rank("species"),
        Taxon::new(9596, "Pan", Some(9604)).with_rank("genus"),
        Taxon::new(9598, "Pan troglodytes", Some(9596)).with_rank("species"),
        Taxon::new(999_999, "Homo sapien", Some(9605)),
    ]
}
