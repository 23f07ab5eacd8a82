//! Compensation calculator
//!
//! **Algorithm:**
//! 1. Validate inputs (fail fast, naming the offending field)
//! 2. compa ratio = current salary / midpoint, half-up to 6 digits
//! 3. Collapse the 1-5 rating to the 3-level performance bucket
//! 4. Look up the single active matrix cell
//! 5. Pick the tenure-side percentage, apply it, round half-up to 2 digits
//!
//! The computation itself is a pure function over a pre-loaded cell slice;
//! the service wrapper adds the lookup and the audit-row side effect.

use crate::services::matrix::{match_cell, OPEN_CEILING};
use crate::types::{CalcOutcome, CalcRequest};
use crate::db;
use chrono::{Local, NaiveDate};
use compa_common::db::{AdjustmentMatrixCell, CalculationResult};
use compa_common::{ids, Error, Result};
use sqlx::SqlitePool;

/// Everything computed for one row
#[derive(Debug, Clone)]
pub struct Computed {
    pub perf_bucket: i64,
    pub compa_ratio: f64,
    pub compa_label: String,
    pub increase_pct: f64,
    pub new_salary: f64,
    pub increase_amount: f64,
}

/// Calculator service
pub struct Calculator {
    db: SqlitePool,
}

impl Calculator {
    /// Create a new calculator over the shared pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Calculate one adjustment and persist the audit row.
    ///
    /// Standalone calls are tagged with a synthetic `single-` batch id.
    pub async fn calculate(&self, tenant_id: &str, req: &CalcRequest) -> Result<CalcOutcome> {
        tracing::info!(tenant_id, employee_code = %req.employee_code, "Starting calculation");
        let started = std::time::Instant::now();

        validate(req)?;

        let as_of = req.as_of.unwrap_or_else(|| Local::now().date_naive());
        let cells = db::matrix::load_active(&self.db, tenant_id).await?;
        let computed = compute(&cells, tenant_id, req, as_of)?;

        let result = CalculationResult {
            id: ids::new_id(),
            tenant_id: tenant_id.to_string(),
            batch_id: ids::single_batch_id(),
            employee_code: req.employee_code.clone(),
            employee_name: req.employee_name.clone(),
            job_title: req.job_title.clone(),
            years_experience: req.years_experience,
            perf_bucket: computed.perf_bucket,
            current_salary: req.current_salary,
            mid_of_scale: req.mid_of_scale,
            compa_ratio: computed.compa_ratio,
            compa_label: computed.compa_label.clone(),
            increase_pct: computed.increase_pct,
            new_salary: computed.new_salary,
        };
        db::results::insert_one(&self.db, &result).await?;

        tracing::info!(
            tenant_id,
            employee_code = %req.employee_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Calculation completed"
        );

        Ok(CalcOutcome {
            compa_ratio: computed.compa_ratio,
            compa_label: computed.compa_label,
            increase_pct: computed.increase_pct,
            new_salary: computed.new_salary,
        })
    }
}

/// Validate a calculation request; violations name the offending field
pub fn validate(req: &CalcRequest) -> Result<()> {
    if req.current_salary <= 0.0 {
        return Err(Error::validation("current salary", "must be positive"));
    }
    if req.mid_of_scale <= 0.0 {
        return Err(Error::validation("mid of scale", "must be positive"));
    }
    if !(1..=5).contains(&req.performance_rating) {
        return Err(Error::validation(
            "performance rating",
            "must be between 1 and 5",
        ));
    }
    if req.years_experience < 0 {
        return Err(Error::validation(
            "years experience",
            "cannot be negative",
        ));
    }

    if req.current_salary > req.mid_of_scale * 3.0 {
        tracing::warn!(
            employee_code = %req.employee_code,
            "Current salary is more than 3x mid of scale"
        );
    }

    Ok(())
}

/// Pure computation over a pre-loaded cell slice (no validation, no I/O).
///
/// The bulk pipeline calls this against its per-request matrix snapshot.
pub fn compute(
    cells: &[AdjustmentMatrixCell],
    tenant_id: &str,
    req: &CalcRequest,
    as_of: NaiveDate,
) -> Result<Computed> {
    let compa_ratio = round_half_up(req.current_salary / req.mid_of_scale, 6);
    let perf_bucket = perf_bucket(req.performance_rating);

    let cell = match_cell(cells, perf_bucket, compa_ratio, as_of).ok_or_else(|| {
        Error::MatrixNotFound(format!(
            "No adjustment matrix found for tenant '{tenant_id}'. \
             Please contact your administrator to set up compensation matrices."
        ))
    })?;

    let increase_pct = if req.years_experience < 5 {
        cell.pct_lt5_years
    } else {
        cell.pct_gte5_years
    };
    let new_salary = round_half_up(req.current_salary * (1.0 + increase_pct / 100.0), 2);
    let increase_amount = round_half_up(new_salary - req.current_salary, 2);

    Ok(Computed {
        perf_bucket,
        compa_ratio,
        compa_label: band_label(cell),
        increase_pct,
        new_salary,
        increase_amount,
    })
}

/// Fixed 5-to-3 bucket collapse: ratings {1,2,3,4,5} map to {1,1,2,3,3}
pub fn perf_bucket(rating: i64) -> i64 {
    if rating >= 4 {
        3
    } else if rating >= 2 {
        2
    } else {
        1
    }
}

/// Round half-up to the given number of fractional digits.
///
/// Inputs here are non-negative (validated), so half-away-from-zero and
/// half-up coincide.
pub fn round_half_up(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Human-readable band label, e.g. "71%–85%" or "130%+" for open ceilings
pub fn band_label(cell: &AdjustmentMatrixCell) -> String {
    let from = fmt_pct(cell.compa_from * 100.0);
    if cell.compa_to >= OPEN_CEILING {
        format!("{from}%+")
    } else {
        let to = fmt_pct(cell.compa_to * 100.0);
        format!("{from}%\u{2013}{to}%")
    }
}

/// Percentage formatting with trailing zeros trimmed ("71", "70.5")
fn fmt_pct(value: f64) -> String {
    let rounded = round_half_up(value, 2);
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
