//! Request/response types for the engine surface

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Input for one compensation calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcRequest {
    pub employee_code: String,
    pub employee_name: Option<String>,
    pub job_title: Option<String>,
    pub years_experience: i64,
    /// Raw performance rating on the 1-5 scale
    pub performance_rating: i64,
    pub current_salary: f64,
    pub mid_of_scale: f64,
    /// Defaults to today when absent
    pub as_of: Option<NaiveDate>,
}

/// Output of one successful compensation calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcOutcome {
    pub compa_ratio: f64,
    pub compa_label: String,
    pub increase_pct: f64,
    pub new_salary: f64,
}

/// Per-row outcome of bulk processing.
///
/// Input fields are always echoed; exactly one of the computed field set or
/// `error` is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRowResult {
    /// Source sheet row (header = 0, first data row = 1)
    pub row_index: u32,
    pub employee_code: String,
    pub employee_name: Option<String>,
    pub job_title: Option<String>,
    pub years_experience: i64,
    pub performance_rating: i64,
    pub current_salary: f64,
    pub mid_of_scale: f64,
    pub compa_ratio: Option<f64>,
    pub compa_label: Option<String>,
    pub increase_pct: Option<f64>,
    pub new_salary: Option<f64>,
    pub increase_amount: Option<f64>,
    pub error: Option<String>,
}

impl BulkRowResult {
    /// True when the row computed successfully
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of one bulk upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResponse {
    pub batch_id: String,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Always in original source row order
    pub rows: Vec<BulkRowResult>,
}
