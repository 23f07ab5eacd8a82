//! Persistent models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cell of a tenant's adjustment matrix.
///
/// Maps (performance bucket × compa-ratio band × effective date range) to an
/// increase percentage split by tenure. Bands are half-open: a ratio matches
/// when `compa_from <= ratio < compa_to`. A `compa_to` of 9.99 or more is the
/// open-ceiling sentinel ("130%+").
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdjustmentMatrixCell {
    pub id: String,
    pub tenant_id: String,
    /// Performance bucket: 1 = low, 2 = meets, 3 = exceeds
    pub perf_bucket: i64,
    pub compa_from: f64,
    pub compa_to: f64,
    /// Increase percentage points for tenure < 5 years
    pub pct_lt5_years: f64,
    /// Increase percentage points for tenure >= 5 years
    pub pct_gte5_years: f64,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    /// Soft-disable without deletion
    pub active: bool,
}

impl AdjustmentMatrixCell {
    /// Half-open band match: `from <= ratio < to`
    pub fn contains_ratio(&self, ratio: f64) -> bool {
        self.compa_from <= ratio && ratio < self.compa_to
    }

    /// Effective-date match: unset bounds are open
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        let from_ok = self.effective_from.map_or(true, |f| f <= date);
        let to_ok = self.effective_to.map_or(true, |t| t >= date);
        from_ok && to_ok
    }
}

/// Audit record for one successfully computed row (individual or bulk).
///
/// Immutable after creation; queryable by batch and by tenant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalculationResult {
    pub id: String,
    pub tenant_id: String,
    /// Groups rows from one bulk upload; `single-` prefix for standalone calls
    pub batch_id: String,
    pub employee_code: String,
    pub employee_name: Option<String>,
    pub job_title: Option<String>,
    pub years_experience: i64,
    /// Derived bucket (1-3), not the raw 1-5 rating
    pub perf_bucket: i64,
    pub current_salary: f64,
    pub mid_of_scale: f64,
    pub compa_ratio: f64,
    pub compa_label: String,
    pub increase_pct: f64,
    pub new_salary: f64,
}

/// Per-batch upload ledger row: created when the upload arrives, updated
/// once when processing ends, read back for status queries
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UploadHistory {
    pub batch_id: String,
    pub tenant_id: String,
    pub file_name: String,
    pub status: String,
    pub total_rows: i64,
    pub success_count: i64,
    pub error_count: i64,
    pub processing_ms: i64,
    pub upload_file_path: Option<String>,
    pub result_file_path: Option<String>,
    /// JSON array of row-level error messages
    pub validation_errors: Option<String>,
}
