//! Integration tests for the adjustment matrix store

use chrono::NaiveDate;
use compa_common::db::init::init_database;
use compa_common::db::AdjustmentMatrixCell;
use compa_common::Error;
use compa_engine::MatrixService;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("test.db")).await.unwrap();
    (pool, dir)
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

#[tokio::test]
async fn seed_creates_seventeen_cells() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);

    let count = service.seed_defaults("acme").await.unwrap();
    assert_eq!(count, 17);
    assert_eq!(service.count("acme").await.unwrap(), 17);
}

#[tokio::test]
async fn reseed_is_refused() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);

    service.seed_defaults("acme").await.unwrap();
    let err = service.seed_defaults("acme").await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    // Still seventeen, not thirty-four
    assert_eq!(service.count("acme").await.unwrap(), 17);
}

#[tokio::test]
async fn lookup_finds_the_seeded_band() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);
    service.seed_defaults("acme").await.unwrap();

    // 0.833333 falls in [0.71, 0.85) for every bucket
    let cell = service
        .find_active_cell("acme", 3, 0.833333, as_of())
        .await
        .unwrap()
        .expect("bucket 3 band should match");
    assert_eq!(cell.compa_from, 0.71);
    assert_eq!(cell.pct_gte5_years, 21.0);
}

#[tokio::test]
async fn lookup_is_idempotent() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);
    service.seed_defaults("acme").await.unwrap();

    let first = service
        .find_active_cell("acme", 2, 0.9, as_of())
        .await
        .unwrap()
        .unwrap();
    let second = service
        .find_active_cell("acme", 2, 0.9, as_of())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn tenants_never_see_each_others_cells() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);
    service.seed_defaults("acme").await.unwrap();

    let hit = service
        .find_active_cell("globex", 3, 0.833333, as_of())
        .await
        .unwrap();
    assert!(hit.is_none(), "no fallback to another tenant's matrix");
}

#[tokio::test]
async fn lookup_before_effective_date_misses() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);
    service.seed_defaults("acme").await.unwrap();

    // Seeded cells are effective from 2025-01-01
    let before = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let hit = service
        .find_active_cell("acme", 3, 0.833333, before)
        .await
        .unwrap();
    assert!(hit.is_none());
}

#[tokio::test]
async fn cell_crud_round_trip() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);

    let created = service
        .create_cell(AdjustmentMatrixCell {
            id: String::new(),
            tenant_id: "acme".to_string(),
            perf_bucket: 2,
            compa_from: 0.5,
            compa_to: 0.9,
            pct_lt5_years: 3.0,
            pct_gte5_years: 5.0,
            effective_from: None,
            effective_to: None,
            active: true,
        })
        .await
        .unwrap();
    assert!(!created.id.is_empty());

    let mut updated = created.clone();
    updated.pct_lt5_years = 4.0;
    assert!(service.update_cell(&updated).await.unwrap());

    let listed = service.list("acme").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pct_lt5_years, 4.0);

    assert!(service.delete_cell("acme", &created.id).await.unwrap());
    assert_eq!(service.count("acme").await.unwrap(), 0);
}

#[tokio::test]
async fn update_is_tenant_scoped() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);

    let created = service
        .create_cell(AdjustmentMatrixCell {
            id: String::new(),
            tenant_id: "acme".to_string(),
            perf_bucket: 2,
            compa_from: 0.5,
            compa_to: 0.9,
            pct_lt5_years: 3.0,
            pct_gte5_years: 5.0,
            effective_from: None,
            effective_to: None,
            active: true,
        })
        .await
        .unwrap();

    // Same id, wrong tenant: no rows touched
    let mut foreign = created.clone();
    foreign.tenant_id = "globex".to_string();
    assert!(!service.update_cell(&foreign).await.unwrap());
    assert!(!service.delete_cell("globex", &created.id).await.unwrap());
}

#[tokio::test]
async fn tenant_removal_cascades() {
    let (pool, _dir) = test_pool().await;
    let service = MatrixService::new(pool);
    service.seed_defaults("acme").await.unwrap();
    service.seed_defaults("globex").await.unwrap();

    let deleted = service.delete_all_for_tenant("acme").await.unwrap();
    assert_eq!(deleted, 17);
    assert_eq!(service.count("acme").await.unwrap(), 0);
    assert_eq!(service.count("globex").await.unwrap(), 17);
}
