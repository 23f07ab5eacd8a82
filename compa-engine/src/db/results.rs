//! Calculation result persistence
//!
//! Audit rows are insert-only; bulk inserts go through bounded-size write
//! chunks so one upload never produces an unbounded transaction.

use crate::pagination::{calculate_pagination, Pagination, PAGE_SIZE};
use compa_common::db::CalculationResult;
use compa_common::Result;
use sqlx::SqlitePool;

const RESULT_COLUMNS: &str = "id, tenant_id, batch_id, employee_code, employee_name, job_title, \
     years_experience, perf_bucket, current_salary, mid_of_scale, compa_ratio, compa_label, \
     increase_pct, new_salary";

/// Insert a single audit row (standalone calculation)
pub async fn insert_one(pool: &SqlitePool, result: &CalculationResult) -> Result<()> {
    let sql = format!(
        "INSERT INTO calculation_results ({RESULT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    bind_result(sqlx::query(&sql), result).execute(pool).await?;
    Ok(())
}

/// Insert audit rows in bounded-size write chunks, one transaction per chunk.
///
/// A failed chunk write propagates; the pipeline must not report success
/// counts for rows whose persistence failed.
pub async fn insert_batch(
    pool: &SqlitePool,
    results: &[CalculationResult],
    chunk_size: usize,
) -> Result<()> {
    if results.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "INSERT INTO calculation_results ({RESULT_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );

    for chunk in results.chunks(chunk_size.max(1)) {
        let mut tx = pool.begin().await?;
        for result in chunk {
            bind_result(sqlx::query(&sql), result)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
    }

    tracing::info!(count = results.len(), "Saved calculation results");
    Ok(())
}

fn bind_result<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    r: &'q CalculationResult,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&r.id)
        .bind(&r.tenant_id)
        .bind(&r.batch_id)
        .bind(&r.employee_code)
        .bind(&r.employee_name)
        .bind(&r.job_title)
        .bind(r.years_experience)
        .bind(r.perf_bucket)
        .bind(r.current_salary)
        .bind(r.mid_of_scale)
        .bind(r.compa_ratio)
        .bind(&r.compa_label)
        .bind(r.increase_pct)
        .bind(r.new_salary)
}

/// All rows of one batch for a tenant, in insertion order
pub async fn find_by_batch(
    pool: &SqlitePool,
    tenant_id: &str,
    batch_id: &str,
) -> Result<Vec<CalculationResult>> {
    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM calculation_results \
         WHERE tenant_id = ? AND batch_id = ? ORDER BY rowid"
    );
    let rows = sqlx::query_as::<_, CalculationResult>(&sql)
        .bind(tenant_id)
        .bind(batch_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// One page of a tenant's results, newest first
pub async fn find_by_tenant(
    pool: &SqlitePool,
    tenant_id: &str,
    requested_page: i64,
) -> Result<(Vec<CalculationResult>, Pagination)> {
    let total = count_by_tenant(pool, tenant_id).await?;
    let pagination = calculate_pagination(total, requested_page);

    let sql = format!(
        "SELECT {RESULT_COLUMNS} FROM calculation_results \
         WHERE tenant_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query_as::<_, CalculationResult>(&sql)
        .bind(tenant_id)
        .bind(PAGE_SIZE)
        .bind(pagination.offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, pagination))
}

/// Total result rows for a tenant
pub async fn count_by_tenant(pool: &SqlitePool, tenant_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM calculation_results WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
