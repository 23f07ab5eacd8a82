//! Upload-history ledger
//!
//! A row is created when an upload arrives and updated once when processing
//! ends; status queries read it back by batch or by tenant.

use compa_common::db::UploadHistory;
use compa_common::Result;
use sqlx::SqlitePool;

const HISTORY_COLUMNS: &str = "batch_id, tenant_id, file_name, status, total_rows, \
     success_count, error_count, processing_ms, upload_file_path, result_file_path, \
     validation_errors";

/// Record a new upload before parsing begins
pub async fn insert(
    pool: &SqlitePool,
    batch_id: &str,
    tenant_id: &str,
    file_name: &str,
    upload_file_path: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO upload_history (batch_id, tenant_id, file_name, status, upload_file_path)
        VALUES (?, ?, ?, 'processing', ?)
        "#,
    )
    .bind(batch_id)
    .bind(tenant_id)
    .bind(file_name)
    .bind(upload_file_path)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the outcome of a completed run
#[allow(clippy::too_many_arguments)]
pub async fn mark_completed(
    pool: &SqlitePool,
    batch_id: &str,
    total_rows: i64,
    success_count: i64,
    error_count: i64,
    processing_ms: i64,
    result_file_path: Option<&str>,
    validation_errors_json: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE upload_history
        SET status = 'completed', total_rows = ?, success_count = ?, error_count = ?,
            processing_ms = ?, result_file_path = ?, validation_errors = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE batch_id = ?
        "#,
    )
    .bind(total_rows)
    .bind(success_count)
    .bind(error_count)
    .bind(processing_ms)
    .bind(result_file_path)
    .bind(validation_errors_json)
    .bind(batch_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a run that failed before producing results
pub async fn mark_failed(pool: &SqlitePool, batch_id: &str, message: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE upload_history
        SET status = 'failed', validation_errors = ?, updated_at = CURRENT_TIMESTAMP
        WHERE batch_id = ?
        "#,
    )
    .bind(message)
    .bind(batch_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// One ledger row by batch id (tenant-scoped)
pub async fn find_by_batch(
    pool: &SqlitePool,
    tenant_id: &str,
    batch_id: &str,
) -> Result<Option<UploadHistory>> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM upload_history WHERE batch_id = ? AND tenant_id = ?"
    );
    let row = sqlx::query_as::<_, UploadHistory>(&sql)
        .bind(batch_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// A tenant's upload history, newest first
pub async fn list_by_tenant(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<UploadHistory>> {
    let sql = format!(
        "SELECT {HISTORY_COLUMNS} FROM upload_history \
         WHERE tenant_id = ? ORDER BY created_at DESC, batch_id DESC"
    );
    let rows = sqlx::query_as::<_, UploadHistory>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
