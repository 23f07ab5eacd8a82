//! Adjustment matrix persistence
//!
//! Every query filters by tenant first; cells are never visible across
//! tenant boundaries.

use compa_common::db::AdjustmentMatrixCell;
use compa_common::Result;
use sqlx::SqlitePool;

const CELL_COLUMNS: &str = "id, tenant_id, perf_bucket, compa_from, compa_to, \
     pct_lt5_years, pct_gte5_years, effective_from, effective_to, active";

/// Insert one matrix cell
pub async fn insert_cell(pool: &SqlitePool, cell: &AdjustmentMatrixCell) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO adjustment_matrix
            (id, tenant_id, perf_bucket, compa_from, compa_to,
             pct_lt5_years, pct_gte5_years, effective_from, effective_to, active)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&cell.id)
    .bind(&cell.tenant_id)
    .bind(cell.perf_bucket)
    .bind(cell.compa_from)
    .bind(cell.compa_to)
    .bind(cell.pct_lt5_years)
    .bind(cell.pct_gte5_years)
    .bind(cell.effective_from)
    .bind(cell.effective_to)
    .bind(cell.active)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a cell's rates, band, dates, and active flag (tenant-scoped)
pub async fn update_cell(pool: &SqlitePool, cell: &AdjustmentMatrixCell) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE adjustment_matrix
        SET perf_bucket = ?, compa_from = ?, compa_to = ?,
            pct_lt5_years = ?, pct_gte5_years = ?,
            effective_from = ?, effective_to = ?, active = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(cell.perf_bucket)
    .bind(cell.compa_from)
    .bind(cell.compa_to)
    .bind(cell.pct_lt5_years)
    .bind(cell.pct_gte5_years)
    .bind(cell.effective_from)
    .bind(cell.effective_to)
    .bind(cell.active)
    .bind(&cell.id)
    .bind(&cell.tenant_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete one cell (tenant-scoped)
pub async fn delete_cell(pool: &SqlitePool, tenant_id: &str, cell_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM adjustment_matrix WHERE id = ? AND tenant_id = ?")
        .bind(cell_id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List all cells for a tenant, active or not
pub async fn list_by_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
) -> Result<Vec<AdjustmentMatrixCell>> {
    let sql = format!(
        "SELECT {CELL_COLUMNS} FROM adjustment_matrix \
         WHERE tenant_id = ? ORDER BY perf_bucket, compa_from"
    );
    let cells = sqlx::query_as::<_, AdjustmentMatrixCell>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

    Ok(cells)
}

/// Load the tenant's active cells, ordered by bucket then band start.
///
/// The bulk pipeline takes this once per request as a read-only snapshot.
pub async fn load_active(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<AdjustmentMatrixCell>> {
    let sql = format!(
        "SELECT {CELL_COLUMNS} FROM adjustment_matrix \
         WHERE tenant_id = ? AND active = 1 ORDER BY perf_bucket, compa_from"
    );
    let cells = sqlx::query_as::<_, AdjustmentMatrixCell>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

    Ok(cells)
}

/// True when the tenant has any matrix cells
pub async fn exists_for_tenant(pool: &SqlitePool, tenant_id: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM adjustment_matrix WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Number of matrix cells for a tenant
pub async fn count_by_tenant(pool: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM adjustment_matrix WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Cascade delete of all cells for a tenant (tenant offboarding)
pub async fn delete_by_tenant(pool: &SqlitePool, tenant_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM adjustment_matrix WHERE tenant_id = ?")
        .bind(tenant_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
