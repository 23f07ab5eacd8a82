//! Adjustment matrix store
//!
//! Point lookup of the single active cell for (tenant, performance bucket,
//! compa ratio, as-of date), plus tenant-scoped administration: CRUD,
//! existence/count, cascade delete, and default-table seeding.

use crate::db;
use chrono::NaiveDate;
use compa_common::db::AdjustmentMatrixCell;
use compa_common::{ids, Error, Result};
use sqlx::SqlitePool;

/// Compa-to values at or above this are an open ceiling ("130%+")
pub const OPEN_CEILING: f64 = 9.99;

/// Matrix store service
pub struct MatrixService {
    db: SqlitePool,
}

impl MatrixService {
    /// Create a new matrix service over the shared pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Find the active cell for the given bucket, ratio, and as-of date.
    ///
    /// Returns `Ok(None)` when no cell matches; callers treat that as a
    /// reportable business condition, not a crash.
    pub async fn find_active_cell(
        &self,
        tenant_id: &str,
        perf_bucket: i64,
        compa_ratio: f64,
        as_of: NaiveDate,
    ) -> Result<Option<AdjustmentMatrixCell>> {
        let cells = db::matrix::load_active(&self.db, tenant_id).await?;
        Ok(match_cell(&cells, perf_bucket, compa_ratio, as_of).cloned())
    }

    /// Create a cell, generating its id
    pub async fn create_cell(&self, mut cell: AdjustmentMatrixCell) -> Result<AdjustmentMatrixCell> {
        validate_cell(&cell)?;
        if cell.id.is_empty() {
            cell.id = ids::new_id();
        }
        db::matrix::insert_cell(&self.db, &cell).await?;
        Ok(cell)
    }

    /// Update a cell; false when the id does not exist for this tenant
    pub async fn update_cell(&self, cell: &AdjustmentMatrixCell) -> Result<bool> {
        validate_cell(cell)?;
        db::matrix::update_cell(&self.db, cell).await
    }

    /// Delete a cell; false when the id does not exist for this tenant
    pub async fn delete_cell(&self, tenant_id: &str, cell_id: &str) -> Result<bool> {
        db::matrix::delete_cell(&self.db, tenant_id, cell_id).await
    }

    /// List all of a tenant's cells
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<AdjustmentMatrixCell>> {
        db::matrix::list_by_tenant(&self.db, tenant_id).await
    }

    /// Number of cells configured for a tenant
    pub async fn count(&self, tenant_id: &str) -> Result<i64> {
        db::matrix::count_by_tenant(&self.db, tenant_id).await
    }

    /// Remove every cell for a tenant (offboarding cascade)
    pub async fn delete_all_for_tenant(&self, tenant_id: &str) -> Result<u64> {
        let deleted = db::matrix::delete_by_tenant(&self.db, tenant_id).await?;
        tracing::info!(tenant_id, deleted, "Deleted tenant matrix cells");
        Ok(deleted)
    }

    /// Seed the default seventeen-row adjustment table for a new tenant.
    ///
    /// Refuses when the tenant already has any cells, so an accidental
    /// re-seed cannot duplicate bands.
    pub async fn seed_defaults(&self, tenant_id: &str) -> Result<usize> {
        if tenant_id.trim().is_empty() {
            return Err(Error::validation("tenant", "tenant id is required"));
        }
        if db::matrix::exists_for_tenant(&self.db, tenant_id).await? {
            return Err(Error::validation(
                "tenant",
                format!("matrices already exist for tenant: {tenant_id}"),
            ));
        }

        let rows = default_matrix_rows();
        let count = rows.len();
        for (bucket, from, to, pct_lt5, pct_gte5) in rows {
            let cell = AdjustmentMatrixCell {
                id: format!("{tenant_id}_m_{bucket}_{from}_{to}"),
                tenant_id: tenant_id.to_string(),
                perf_bucket: bucket,
                compa_from: from,
                compa_to: to,
                pct_lt5_years: pct_lt5,
                pct_gte5_years: pct_gte5,
                effective_from: NaiveDate::from_ymd_opt(2025, 1, 1),
                effective_to: None,
                active: true,
            };
            db::matrix::insert_cell(&self.db, &cell).await?;
        }

        tracing::info!(tenant_id, count, "Seeded default adjustment matrix");
        Ok(count)
    }
}

/// Pure cell matcher shared by the store and the bulk snapshot path.
///
/// Filters by bucket, active flag, half-open band, and effective date range.
/// Bands for one tenant/bucket/date should not overlap; when they do the
/// first match (by band start) wins and a warning is logged.
pub fn match_cell(
    cells: &[AdjustmentMatrixCell],
    perf_bucket: i64,
    compa_ratio: f64,
    as_of: NaiveDate,
) -> Option<&AdjustmentMatrixCell> {
    let mut matches = cells.iter().filter(|c| {
        c.active
            && c.perf_bucket == perf_bucket
            && c.contains_ratio(compa_ratio)
            && c.is_effective_on(as_of)
    });

    let first = matches.next()?;
    let extra = matches.count();
    if extra > 0 {
        tracing::warn!(
            tenant_id = %first.tenant_id,
            perf_bucket,
            compa_ratio,
            overlapping = extra + 1,
            "Overlapping matrix bands; taking first match"
        );
    }
    Some(first)
}

fn validate_cell(cell: &AdjustmentMatrixCell) -> Result<()> {
    if cell.tenant_id.trim().is_empty() {
        return Err(Error::validation("tenant", "tenant id is required"));
    }
    if !(1..=3).contains(&cell.perf_bucket) {
        return Err(Error::validation(
            "performance bucket",
            "must be between 1 and 3",
        ));
    }
    if cell.compa_from < 0.0 || cell.compa_to <= cell.compa_from {
        return Err(Error::validation(
            "compa band",
            "band must satisfy 0 <= from < to",
        ));
    }
    if cell.pct_lt5_years < 0.0 || cell.pct_gte5_years < 0.0 {
        return Err(Error::validation(
            "increase percentage",
            "percentages cannot be negative",
        ));
    }
    Ok(())
}

/// Canonical default table: (bucket, from, to, pct <5y, pct >=5y).
///
/// Three performance buckets with up to six compa bands each; the top band of
/// every bucket is open-ended at the ceiling sentinel.
fn default_matrix_rows() -> Vec<(i64, f64, f64, f64, f64)> {
    vec![
        // Bucket 3 (exceeds targets)
        (3, 0.00, 0.70, 21.0, 25.0),
        (3, 0.71, 0.85, 17.0, 21.0),
        (3, 0.86, 1.00, 12.0, 17.0),
        (3, 1.01, 1.15, 8.0, 12.0),
        (3, 1.16, 1.30, 6.0, 8.0),
        (3, 1.30, OPEN_CEILING, 0.0, 0.0),
        // Bucket 2 (meets targets)
        (2, 0.00, 0.70, 15.0, 17.0),
        (2, 0.71, 0.85, 12.0, 17.0),
        (2, 0.86, 1.00, 8.0, 12.0),
        (2, 1.01, 1.15, 6.0, 8.0),
        (2, 1.16, 1.30, 4.0, 6.0),
        (2, 1.30, OPEN_CEILING, 0.0, 0.0),
        // Bucket 1 (partially meets)
        (1, 0.00, 0.70, 8.0, 12.0),
        (1, 0.71, 0.85, 6.0, 8.0),
        (1, 0.86, 1.00, 4.0, 6.0),
        (1, 1.01, 1.15, 0.0, 4.0),
        (1, 1.16, OPEN_CEILING, 0.0, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(bucket: i64, from: f64, to: f64) -> AdjustmentMatrixCell {
        AdjustmentMatrixCell {
            id: format!("c_{bucket}_{from}"),
            tenant_id: "t1".to_string(),
            perf_bucket: bucket,
            compa_from: from,
            compa_to: to,
            pct_lt5_years: 5.0,
            pct_gte5_years: 10.0,
            effective_from: None,
            effective_to: None,
            active: true,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn default_table_has_seventeen_rows() {
        assert_eq!(default_matrix_rows().len(), 17);
        // One open-ceiling band per bucket
        for bucket in 1..=3 {
            let open = default_matrix_rows()
                .iter()
                .filter(|(b, _, to, _, _)| *b == bucket && *to >= OPEN_CEILING)
                .count();
            assert_eq!(open, 1, "bucket {bucket} should have one open band");
        }
    }

    #[test]
    fn ratio_on_lower_bound_matches() {
        let cells = vec![cell(2, 0.86, 1.00), cell(2, 1.00, 1.15)];
        let hit = match_cell(&cells, 2, 0.86, today()).unwrap();
        assert_eq!(hit.compa_from, 0.86);
    }

    #[test]
    fn ratio_on_upper_bound_matches_next_band() {
        let cells = vec![cell(2, 0.86, 1.00), cell(2, 1.00, 1.15)];
        let hit = match_cell(&cells, 2, 1.00, today()).unwrap();
        assert_eq!(hit.compa_from, 1.00);
    }

    #[test]
    fn inactive_cells_are_skipped() {
        let mut c = cell(2, 0.86, 1.00);
        c.active = false;
        assert!(match_cell(&[c], 2, 0.9, today()).is_none());
    }

    #[test]
    fn wrong_bucket_is_not_matched() {
        let cells = vec![cell(3, 0.0, 2.0)];
        assert!(match_cell(&cells, 2, 0.9, today()).is_none());
    }

    #[test]
    fn date_range_is_honored() {
        let mut c = cell(2, 0.0, 2.0);
        c.effective_from = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(match_cell(std::slice::from_ref(&c), 2, 0.9, today()).is_none());

        c.effective_from = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert!(match_cell(std::slice::from_ref(&c), 2, 0.9, today()).is_some());
    }

    #[test]
    fn overlap_takes_first_match() {
        let cells = vec![cell(2, 0.8, 1.2), cell(2, 0.9, 1.1)];
        let hit = match_cell(&cells, 2, 1.0, today()).unwrap();
        assert_eq!(hit.compa_from, 0.8);
    }
}
