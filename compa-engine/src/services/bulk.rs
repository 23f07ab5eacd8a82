//! Bulk processing pipeline
//!
//! **Algorithm:**
//! 1. Generate a time-ordered batch id, store the upload, open a ledger row
//! 2. Parse the workbook (a file-level failure aborts, nothing persisted)
//! 3. Snapshot the tenant's active matrix cells (read-only for the request)
//! 4. Partition rows into batches and fan out over a bounded worker pool
//! 5. Reassemble in original row order, regardless of completion order
//! 6. Persist successful rows in bounded write chunks
//! 7. Generate and store the result workbook, close the ledger row
//!
//! Row-level failures (validation, missing matrix cell) are captured in the
//! row result and never abort the batch. A parse failure, worker fault, or
//! timeout fails the whole pipeline with no partial persistence.

use crate::db;
use crate::services::calculator::{compute, validate};
use crate::services::export::export_rows;
use crate::services::sheet::{self, ColumnLayout, EmployeeRow};
use crate::storage::FileStorage;
use crate::types::{BulkResponse, BulkRowResult, CalcRequest};
use chrono::{Local, NaiveDate};
use compa_common::config::EngineConfig;
use compa_common::db::{AdjustmentMatrixCell, CalculationResult};
use compa_common::{ids, Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Bulk processing pipeline
pub struct BulkProcessor {
    db: SqlitePool,
    storage: FileStorage,
    workers: usize,
    write_batch_size: usize,
    timeout: Duration,
}

impl BulkProcessor {
    /// Create a pipeline over the shared pool and file storage
    pub fn new(db: SqlitePool, storage: FileStorage, config: &EngineConfig) -> Self {
        Self {
            db,
            storage,
            workers: config.effective_workers(),
            write_batch_size: config.write_batch_size,
            timeout: Duration::from_secs(config.bulk_timeout_secs),
        }
    }

    /// Process one uploaded workbook for a tenant
    pub async fn process(
        &self,
        tenant_id: &str,
        file_name: &str,
        file_bytes: &[u8],
        layout: ColumnLayout,
    ) -> Result<BulkResponse> {
        let batch_id = ids::new_batch_id();
        let started = std::time::Instant::now();
        tracing::info!(tenant_id, batch_id = %batch_id, file_name, "Starting bulk processing");

        let upload_path = self.storage.store_upload(tenant_id, &batch_id, file_bytes)?;
        db::history::insert(&self.db, &batch_id, tenant_id, file_name, Some(&upload_path)).await?;

        let parsed = match sheet::parse(file_bytes, layout) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(batch_id = %batch_id, error = %e, "Upload unreadable");
                self.try_mark_failed(&batch_id, &e).await;
                return Err(e);
            }
        };

        let snapshot = Arc::new(db::matrix::load_active(&self.db, tenant_id).await?);
        let as_of = Local::now().date_naive();

        let rows = match self
            .compute_all(tenant_id, &snapshot, parsed, as_of)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                self.try_mark_failed(&batch_id, &e).await;
                return Err(e);
            }
        };

        // Persist successful rows before reporting counts; a failed write
        // must not be reported as success
        let successful: Vec<CalculationResult> = rows
            .iter()
            .filter(|r| r.is_success())
            .map(|r| self.to_audit_row(tenant_id, &batch_id, r))
            .collect();
        db::results::insert_batch(&self.db, &successful, self.write_batch_size).await?;

        let total_rows = rows.len();
        let success_count = successful.len();
        let error_count = total_rows - success_count;

        let result_bytes = export_rows(&rows)?;
        let result_path = self
            .storage
            .store_result(tenant_id, &batch_id, &result_bytes)?;

        let errors: Vec<&str> = rows.iter().filter_map(|r| r.error.as_deref()).collect();
        let errors_json = serde_json::to_string(&errors)
            .map_err(|e| Error::Internal(format!("error summary serialization failed: {e}")))?;
        let processing_ms = started.elapsed().as_millis() as i64;
        db::history::mark_completed(
            &self.db,
            &batch_id,
            total_rows as i64,
            success_count as i64,
            error_count as i64,
            processing_ms,
            Some(&result_path),
            Some(&errors_json),
        )
        .await?;

        tracing::info!(
            batch_id = %batch_id,
            total_rows,
            success_count,
            error_count,
            processing_ms,
            "Bulk processing completed"
        );

        Ok(BulkResponse {
            batch_id,
            total_rows,
            success_count,
            error_count,
            rows,
        })
    }

    /// Retrieve the stored result workbook for a batch
    pub fn load_result_file(&self, tenant_id: &str, batch_id: &str) -> Result<Vec<u8>> {
        self.storage
            .load(&format!("results/{tenant_id}/{batch_id}.xlsx"))
    }

    /// Fan rows out over the worker pool and reassemble in source order
    async fn compute_all(
        &self,
        tenant_id: &str,
        snapshot: &Arc<Vec<AdjustmentMatrixCell>>,
        parsed: Vec<EmployeeRow>,
        as_of: NaiveDate,
    ) -> Result<Vec<BulkRowResult>> {
        if parsed.is_empty() {
            return Ok(Vec::new());
        }

        // Heuristic balancing parallelism against per-task overhead
        let batch_size = (parsed.len() / 10).max(100);
        let batches: Vec<Vec<EmployeeRow>> = parsed
            .chunks(batch_size)
            .map(|c| c.to_vec())
            .collect();
        tracing::info!(
            rows = parsed.len(),
            batches = batches.len(),
            batch_size,
            workers = self.workers,
            "Dispatching batches"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut join_set: JoinSet<(usize, Result<Vec<BulkRowResult>>)> = JoinSet::new();

        for (batch_index, batch) in batches.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let snapshot = Arc::clone(snapshot);
            let tenant = tenant_id.to_string();
            join_set.spawn(async move {
                // The semaphore is never closed; a lost permit only widens
                // concurrency, so no permit is not a failure
                let _permit = semaphore.acquire_owned().await.ok();
                let results: Result<Vec<BulkRowResult>> = batch
                    .iter()
                    .map(|row| compute_row(&snapshot, &tenant, row, as_of))
                    .collect();
                (batch_index, results)
            });
        }

        let drain = async {
            let mut parts: Vec<(usize, Vec<BulkRowResult>)> = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                let (batch_index, results) = joined
                    .map_err(|e| Error::Internal(format!("bulk worker task failed: {e}")))?;
                parts.push((batch_index, results?));
            }
            Ok::<_, Error>(parts)
        };

        let mut parts = tokio::time::timeout(self.timeout, drain)
            .await
            .map_err(|_| {
                Error::Internal(format!(
                    "bulk processing timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        // Stable reassembly: partition order, then source row index
        parts.sort_by_key(|(batch_index, _)| *batch_index);
        let mut rows: Vec<BulkRowResult> = parts.into_iter().flat_map(|(_, v)| v).collect();
        rows.sort_by_key(|r| r.row_index);
        Ok(rows)
    }

    fn to_audit_row(
        &self,
        tenant_id: &str,
        batch_id: &str,
        row: &BulkRowResult,
    ) -> CalculationResult {
        CalculationResult {
            id: ids::new_id(),
            tenant_id: tenant_id.to_string(),
            batch_id: batch_id.to_string(),
            employee_code: row.employee_code.clone(),
            employee_name: row.employee_name.clone(),
            job_title: row.job_title.clone(),
            years_experience: row.years_experience,
            perf_bucket: crate::services::calculator::perf_bucket(row.performance_rating),
            current_salary: row.current_salary,
            mid_of_scale: row.mid_of_scale,
            compa_ratio: row.compa_ratio.unwrap_or_default(),
            compa_label: row.compa_label.clone().unwrap_or_default(),
            increase_pct: row.increase_pct.unwrap_or_default(),
            new_salary: row.new_salary.unwrap_or_default(),
        }
    }

    async fn try_mark_failed(&self, batch_id: &str, error: &Error) {
        if let Err(e) = db::history::mark_failed(&self.db, batch_id, &error.to_string()).await {
            tracing::warn!(batch_id, error = %e, "Could not update upload ledger");
        }
    }
}

/// Compute one row, capturing row-level errors in the result.
///
/// Validation and missing-matrix failures become the row's `error` with the
/// inputs echoed; any other error fails the whole batch.
fn compute_row(
    cells: &[AdjustmentMatrixCell],
    tenant_id: &str,
    row: &EmployeeRow,
    as_of: NaiveDate,
) -> Result<BulkRowResult> {
    let req = CalcRequest {
        employee_code: row.employee_code.clone(),
        employee_name: row.employee_name.clone(),
        job_title: row.job_title.clone(),
        years_experience: row.years_experience,
        performance_rating: row.performance_rating,
        current_salary: row.current_salary,
        mid_of_scale: row.mid_of_scale,
        as_of: Some(as_of),
    };

    let outcome = validate(&req).and_then(|()| compute(cells, tenant_id, &req, as_of));

    let mut result = BulkRowResult {
        row_index: row.row_index,
        employee_code: row.employee_code.clone(),
        employee_name: row.employee_name.clone(),
        job_title: row.job_title.clone(),
        years_experience: row.years_experience,
        performance_rating: row.performance_rating,
        current_salary: row.current_salary,
        mid_of_scale: row.mid_of_scale,
        compa_ratio: None,
        compa_label: None,
        increase_pct: None,
        new_salary: None,
        increase_amount: None,
        error: None,
    };

    match outcome {
        Ok(computed) => {
            result.compa_ratio = Some(computed.compa_ratio);
            result.compa_label = Some(computed.compa_label);
            result.increase_pct = Some(computed.increase_pct);
            result.new_salary = Some(computed.new_salary);
            result.increase_amount = Some(computed.increase_amount);
        }
        Err(e) if e.is_row_level() => {
            tracing::warn!(row_index = row.row_index, error = %e, "Row computation failed");
            result.error = Some(e.to_string());
        }
        Err(e) => return Err(e),
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<AdjustmentMatrixCell> {
        vec![AdjustmentMatrixCell {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            perf_bucket: 3,
            compa_from: 0.71,
            compa_to: 0.85,
            pct_lt5_years: 17.0,
            pct_gte5_years: 21.0,
            effective_from: None,
            effective_to: None,
            active: true,
        }]
    }

    fn row(mid: f64) -> EmployeeRow {
        EmployeeRow {
            row_index: 2,
            employee_code: "E001".to_string(),
            employee_name: None,
            job_title: Some("Engineer".to_string()),
            years_experience: 7,
            performance_rating: 5,
            current_salary: 50000.0,
            mid_of_scale: mid,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn valid_row_computes() {
        let r = compute_row(&cells(), "t1", &row(60000.0), today()).unwrap();
        assert!(r.is_success());
        assert_eq!(r.new_salary, Some(60500.00));
        assert_eq!(r.increase_amount, Some(10500.00));
    }

    #[test]
    fn validation_failure_is_captured_in_the_row() {
        let r = compute_row(&cells(), "t1", &row(0.0), today()).unwrap();
        assert!(!r.is_success());
        assert!(r.error.unwrap().contains("mid of scale"));
        assert_eq!(r.employee_code, "E001", "inputs are echoed");
        assert!(r.new_salary.is_none());
    }

    #[test]
    fn missing_band_is_captured_in_the_row() {
        // Ratio 2.0 is outside the only configured band
        let r = compute_row(&cells(), "t1", &row(25000.0), today()).unwrap();
        assert!(!r.is_success());
        assert!(r.error.unwrap().contains("administrator"));
    }
}
