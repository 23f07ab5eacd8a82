//! Result exporter
//!
//! Renders an ordered set of bulk row results back into an .xlsx byte
//! stream. Failed rows echo their inputs and error text and leave the
//! computed columns blank; computed rows leave the error column blank.

use crate::types::BulkRowResult;
use compa_common::{Error, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

/// Fixed header row of the result workbook
pub const EXPORT_HEADERS: [&str; 14] = [
    "Row Index",
    "Employee Code",
    "Employee Name",
    "Job Title",
    "Years Experience",
    "Performance Rating",
    "Current Salary",
    "Mid of Scale",
    "Compa Ratio",
    "Band",
    "Increase %",
    "New Salary",
    "Increase Amount",
    "Error",
];

/// Render the result rows into workbook bytes
pub fn export_rows(rows: &[BulkRowResult]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Calculation Results")
        .map_err(map_write_error)?;

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(map_write_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        write_row(worksheet, r, row)?;
    }

    workbook.save_to_buffer().map_err(map_write_error)
}

fn write_row(ws: &mut Worksheet, r: u32, row: &BulkRowResult) -> Result<()> {
    ws.write_number(r, 0, row.row_index as f64)
        .map_err(map_write_error)?;
    ws.write_string(r, 1, &row.employee_code)
        .map_err(map_write_error)?;
    if let Some(name) = &row.employee_name {
        ws.write_string(r, 2, name).map_err(map_write_error)?;
    }
    if let Some(title) = &row.job_title {
        ws.write_string(r, 3, title).map_err(map_write_error)?;
    }
    ws.write_number(r, 4, row.years_experience as f64)
        .map_err(map_write_error)?;
    ws.write_number(r, 5, row.performance_rating as f64)
        .map_err(map_write_error)?;
    ws.write_number(r, 6, row.current_salary)
        .map_err(map_write_error)?;
    ws.write_number(r, 7, row.mid_of_scale)
        .map_err(map_write_error)?;

    if let Some(ratio) = row.compa_ratio {
        ws.write_number(r, 8, ratio).map_err(map_write_error)?;
    }
    if let Some(label) = &row.compa_label {
        ws.write_string(r, 9, label).map_err(map_write_error)?;
    }
    if let Some(pct) = row.increase_pct {
        ws.write_number(r, 10, pct).map_err(map_write_error)?;
    }
    if let Some(salary) = row.new_salary {
        ws.write_number(r, 11, salary).map_err(map_write_error)?;
    }
    if let Some(amount) = row.increase_amount {
        ws.write_number(r, 12, amount).map_err(map_write_error)?;
    }
    if let Some(error) = &row.error {
        ws.write_string(r, 13, error).map_err(map_write_error)?;
    }

    Ok(())
}

fn map_write_error(e: rust_xlsxwriter::XlsxError) -> Error {
    Error::Internal(format!("failed to generate result workbook: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_row(idx: u32) -> BulkRowResult {
        BulkRowResult {
            row_index: idx,
            employee_code: format!("E{idx:03}"),
            employee_name: None,
            job_title: Some("Engineer".to_string()),
            years_experience: 7,
            performance_rating: 5,
            current_salary: 50000.0,
            mid_of_scale: 60000.0,
            compa_ratio: Some(0.833333),
            compa_label: Some("71%\u{2013}85%".to_string()),
            increase_pct: Some(21.0),
            new_salary: Some(60500.0),
            increase_amount: Some(10500.0),
            error: None,
        }
    }

    fn error_row(idx: u32) -> BulkRowResult {
        BulkRowResult {
            row_index: idx,
            employee_code: format!("E{idx:03}"),
            employee_name: None,
            job_title: None,
            years_experience: 2,
            performance_rating: 3,
            current_salary: 50000.0,
            mid_of_scale: 0.0,
            compa_ratio: None,
            compa_label: None,
            increase_pct: None,
            new_salary: None,
            increase_amount: None,
            error: Some("Invalid mid of scale: must be positive".to_string()),
        }
    }

    #[test]
    fn export_produces_a_workbook() {
        let bytes = export_rows(&[success_row(1), error_row(2)]).unwrap();
        // xlsx containers are zip files
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn export_of_empty_rows_is_still_a_workbook() {
        let bytes = export_rows(&[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
