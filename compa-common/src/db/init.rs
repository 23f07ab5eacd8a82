//! Database initialization
//!
//! Creates the database file on first run and brings the schema up
//! idempotently (`CREATE TABLE IF NOT EXISTS`); safe to call at every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; the bulk pipeline
    // issues chunked writes while result queries may be running
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_adjustment_matrix_table(pool).await?;
    create_calculation_results_table(pool).await?;
    create_upload_history_table(pool).await?;
    Ok(())
}

async fn create_adjustment_matrix_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS adjustment_matrix (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            perf_bucket INTEGER NOT NULL,
            compa_from REAL NOT NULL,
            compa_to REAL NOT NULL,
            pct_lt5_years REAL NOT NULL,
            pct_gte5_years REAL NOT NULL,
            effective_from TEXT,
            effective_to TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_matrix_tenant_bucket
        ON adjustment_matrix (tenant_id, perf_bucket, active)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_calculation_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calculation_results (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            batch_id TEXT NOT NULL,
            employee_code TEXT NOT NULL,
            employee_name TEXT,
            job_title TEXT,
            years_experience INTEGER NOT NULL,
            perf_bucket INTEGER NOT NULL,
            current_salary REAL NOT NULL,
            mid_of_scale REAL NOT NULL,
            compa_ratio REAL NOT NULL,
            compa_label TEXT NOT NULL,
            increase_pct REAL NOT NULL,
            new_salary REAL NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_results_tenant_batch
        ON calculation_results (tenant_id, batch_id)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_upload_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upload_history (
            batch_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            file_name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'processing',
            total_rows INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            error_count INTEGER NOT NULL DEFAULT 0,
            processing_ms INTEGER NOT NULL DEFAULT 0,
            upload_file_path TEXT,
            result_file_path TEXT,
            validation_errors TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
