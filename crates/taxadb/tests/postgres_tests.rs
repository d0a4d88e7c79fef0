//! Resolver against a real Postgres
//!
//! Run with: `cargo test -p taxadb --test postgres_tests -- --ignored`
//! (needs a Docker daemon for testcontainers)

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{primate_taxa, scenario_taxa, TestPostgres};
use taxadb::db::DbConfig;
use taxadb::{
    Config, LineageStrategy, PgTaxonStore, ResolverConfig, TaxId, Taxon, TaxonomyError,
    TaxonomyResolver,
};

async fn seeded(taxa: &[Taxon]) -> TestPostgres {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    pg.seed(taxa).await.expect("Failed to seed taxa");
    pg
}

async fn resolver(pg: &TestPostgres, config: ResolverConfig) -> TaxonomyResolver<PgTaxonStore> {
    let store = PgTaxonStore::new(pg.pool_clone(), config.table.clone()).unwrap();
    TaxonomyResolver::new(store, config).await.unwrap()
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_open_and_resolve_scenario() {
    let pg = seeded(&scenario_taxa()).await;

    let config = Config {
        database: DbConfig::default().with_url(pg.connection_string()),
        resolver: ResolverConfig::default(),
    };
    let resolver = taxadb::open(&config).await.unwrap();

    assert_eq!(resolver.name_for_taxid(3).await.unwrap().as_deref(), Some("Homo sapiens"));
    assert_eq!(resolver.taxid_for_name("Homo sapiens").await.unwrap(), Some(3));
    assert_eq!(resolver.lineage_ids(3, false).await.unwrap(), Some(vec![2]));
    assert_eq!(
        resolver.lineage_names(3, true).await.unwrap(),
        Some(vec!["Eukaryota".to_string()])
    );

    assert_eq!(resolver.name_for_taxid(42).await.unwrap(), None);
    assert_eq!(resolver.taxid_for_name("Pan troglodytes").await.unwrap(), None);
    assert_eq!(resolver.lineage_ids(42, false).await.unwrap(), None);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_fuzzy_search_uses_trigram_similarity() {
    let pg = seeded(&primate_taxa()).await;
    let resolver = resolver(&pg, ResolverConfig::default()).await;

    let hits = resolver
        .fuzzy_taxids_for_name("Homo sapiens", Some(3))
        .await
        .unwrap();
    let ids: Vec<TaxId> = hits.iter().map(|hit| hit.taxid()).collect();
    assert_eq!(ids, vec![9606, 999_999, 9605]);

    assert_eq!(hits[0].similarity, 1.0);
    assert_eq!(hits[0].edit_distance, 0);
    assert_eq!(hits[1].edit_distance, 1);
    assert!((hits[1].similarity - 11.0 / 14.0).abs() < 1e-4);
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));

    assert!(resolver
        .fuzzy_taxids_for_name("Xanthomonas", None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_fuzzy_threshold_does_not_leak_into_session() {
    let pg = seeded(&primate_taxa()).await;
    let config = ResolverConfig::default().with_similarity_threshold(0.9);
    let resolver = resolver(&pg, config).await;

    let hits = resolver.fuzzy_taxids_for_name("Homo sapiens", None).await.unwrap();
    assert_eq!(hits.len(), 1);

    let threshold: String = sqlx::query_scalar("SHOW pg_trgm.similarity_threshold")
        .fetch_one(pg.pool())
        .await
        .unwrap();
    assert_eq!(threshold, "0.3");
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_lineage_strategies_agree() {
    let pg = seeded(&primate_taxa()).await;

    let expected = vec![9605, 9604, 9443, 40674, 7711, 33208, 2759, 131567];
    for strategy in [LineageStrategy::Iterative, LineageStrategy::Recursive] {
        let config = ResolverConfig::default().with_lineage_strategy(strategy);
        let resolver = resolver(&pg, config).await;

        assert_eq!(
            resolver.lineage_ids(9606, false).await.unwrap(),
            Some(expected.clone()),
            "{:?}",
            strategy
        );
        let mut reversed = expected.clone();
        reversed.reverse();
        assert_eq!(resolver.lineage_ids(9606, true).await.unwrap(), Some(reversed));
        assert_eq!(resolver.lineage_ids(1, false).await.unwrap(), Some(vec![]));
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_broken_chains_fail_both_strategies() {
    let mut taxa = scenario_taxa();
    taxa.push(Taxon::new(20, "Dangling", Some(404)));
    taxa.push(Taxon::new(30, "Loop A", Some(31)));
    taxa.push(Taxon::new(31, "Loop B", Some(30)));
    let pg = seeded(&taxa).await;

    for strategy in [LineageStrategy::Iterative, LineageStrategy::Recursive] {
        let config = ResolverConfig::default()
            .with_lineage_strategy(strategy)
            .with_max_lineage_depth(16);
        let resolver = resolver(&pg, config).await;

        assert!(matches!(
            resolver.lineage_ids(20, false).await,
            Err(TaxonomyError::MissingParent {
                taxid: 20,
                parent_taxid: 404
            })
        ));
        assert!(matches!(
            resolver.lineage_ids(30, false).await,
            Err(TaxonomyError::LineageTooDeep {
                taxid: 30,
                max_depth: 16
            })
        ));
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_duplicate_names_pick_lowest_taxid() {
    let mut taxa = scenario_taxa();
    taxa.push(Taxon::new(55087, "Bacillus", Some(2)));
    taxa.push(Taxon::new(1386, "Bacillus", Some(2)));
    let pg = seeded(&taxa).await;
    let resolver = resolver(&pg, ResolverConfig::default()).await;

    assert_eq!(resolver.taxid_for_name("Bacillus").await.unwrap(), Some(1386));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_missing_table_fails_construction() {
    let pg = TestPostgres::start_empty().await.unwrap();

    let store = PgTaxonStore::new(pg.pool_clone(), "taxa").unwrap();
    let result = TaxonomyResolver::new(store, ResolverConfig::default()).await;
    assert!(matches!(result, Err(TaxonomyError::MissingTable(ref t)) if t == "taxa"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_fuzzy_without_extensions_is_unsupported() {
    let pg = TestPostgres::start_empty().await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE bare_taxa (
            ncbi_taxid INTEGER PRIMARY KEY,
            parent_taxid INTEGER,
            tax_name TEXT NOT NULL,
            lineage_level VARCHAR(64)
        )
        "#,
    )
    .execute(pg.pool())
    .await
    .unwrap();
    sqlx::query("INSERT INTO bare_taxa VALUES (1, 1, 'root', NULL), (2, 1, 'Eukaryota', NULL)")
        .execute(pg.pool())
        .await
        .unwrap();

    let config = ResolverConfig::default().with_table("bare_taxa");
    let resolver = resolver(&pg, config).await;

    assert_eq!(
        resolver.store().missing_fuzzy_extensions().await.unwrap(),
        vec!["pg_trgm".to_string(), "fuzzystrmatch".to_string()]
    );
    assert!(matches!(
        resolver.fuzzy_taxids_for_name("Eukaryota", None).await,
        Err(TaxonomyError::UnsupportedFeature(_))
    ));

    // Everything else keeps working
    assert_eq!(resolver.taxid_for_name("Eukaryota").await.unwrap(), Some(2));
    assert_eq!(resolver.lineage_ids(2, false).await.unwrap(), Some(vec![]));
}
