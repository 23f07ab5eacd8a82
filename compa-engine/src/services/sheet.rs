//! Tabular input reader
//!
//! Parses an uploaded workbook into typed employee rows. Decoding is
//! tolerant at cell granularity (a bad cell degrades to null/zero with a
//! warning, never an error) and strict at file granularity (an unreadable
//! container aborts with remediation guidance).
//!
//! Container opening tries the strict `.xlsx` reader first, then the legacy
//! `.xls` reader; one bounded fallback, so the real failure stays visible.

use calamine::{Data, Range, Reader, Xls, Xlsx};
use compa_common::{Error, Result};
use std::io::Cursor;

/// Input column order, defined in exactly one place.
///
/// The standard layout is: employee code, job title, years of experience,
/// performance rating, current salary, mid of scale. Some deployments insert
/// an employee-name column after the code.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    has_employee_name: bool,
}

impl ColumnLayout {
    /// Six-column layout without an employee name
    pub fn standard() -> Self {
        Self {
            has_employee_name: false,
        }
    }

    /// Seven-column layout with an employee name after the code
    pub fn with_employee_name() -> Self {
        Self {
            has_employee_name: true,
        }
    }

    fn code(&self) -> usize {
        0
    }

    fn name(&self) -> Option<usize> {
        self.has_employee_name.then_some(1)
    }

    fn offset(&self) -> usize {
        usize::from(self.has_employee_name)
    }

    fn job_title(&self) -> usize {
        1 + self.offset()
    }

    fn years(&self) -> usize {
        2 + self.offset()
    }

    fn rating(&self) -> usize {
        3 + self.offset()
    }

    fn salary(&self) -> usize {
        4 + self.offset()
    }

    fn midpoint(&self) -> usize {
        5 + self.offset()
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// One semantic record per data row, raw sheet position preserved
#[derive(Debug, Clone)]
pub struct EmployeeRow {
    /// Absolute sheet row (header = 0, first data row = 1); blank rows are
    /// skipped without renumbering later rows
    pub row_index: u32,
    pub employee_code: String,
    pub employee_name: Option<String>,
    pub job_title: Option<String>,
    pub years_experience: i64,
    pub performance_rating: i64,
    pub current_salary: f64,
    pub mid_of_scale: f64,
}

/// Parse a workbook into employee rows, skipping the header row
pub fn parse(bytes: &[u8], layout: ColumnLayout) -> Result<Vec<EmployeeRow>> {
    let range = open_first_sheet(bytes)?;
    let start_row = range.start().map(|(r, _)| r).unwrap_or(0);

    let mut rows = Vec::new();
    for (i, cells) in range.rows().enumerate() {
        let row_index = start_row + i as u32;
        if row_index == 0 {
            continue; // header
        }
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            tracing::debug!(row_index, "Skipping blank row");
            continue;
        }

        rows.push(EmployeeRow {
            row_index,
            employee_code: get_string(cells, layout.code(), row_index).unwrap_or_default(),
            employee_name: layout.name().and_then(|c| get_string(cells, c, row_index)),
            job_title: get_string(cells, layout.job_title(), row_index),
            years_experience: get_numeric(cells, layout.years(), row_index) as i64,
            performance_rating: get_numeric(cells, layout.rating(), row_index) as i64,
            current_salary: get_numeric(cells, layout.salary(), row_index),
            mid_of_scale: get_numeric(cells, layout.midpoint(), row_index),
        });
    }

    tracing::debug!(rows = rows.len(), "Parsed upload");
    Ok(rows)
}

/// Open the first worksheet: strict .xlsx, then legacy .xls
fn open_first_sheet(bytes: &[u8]) -> Result<Range<Data>> {
    match Xlsx::new(Cursor::new(bytes)) {
        Ok(mut workbook) => match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => return Ok(range),
            Some(Err(e)) => return Err(classify_open_error(&e.to_string())),
            None => {
                return Err(Error::FileFormat(
                    "The workbook contains no sheets.".to_string(),
                ))
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "Strict .xlsx open failed, trying legacy .xls");
        }
    }

    match Xls::new(Cursor::new(bytes)) {
        Ok(mut workbook) => match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => Ok(range),
            Some(Err(e)) => Err(classify_open_error(&e.to_string())),
            None => Err(Error::FileFormat(
                "The workbook contains no sheets.".to_string(),
            )),
        },
        Err(e) => Err(classify_open_error(&e.to_string())),
    }
}

/// Map a low-level reader failure to actionable remediation guidance
fn classify_open_error(message: &str) -> Error {
    let lower = message.to_lowercase();
    if lower.contains("date") || lower.contains("datetime") {
        Error::FileFormat(
            "The file contains unsupported date formats. \
             Please convert date columns to text before uploading."
                .to_string(),
        )
    } else if lower.contains("unsupported") {
        Error::FileFormat(
            "The file contains unsupported formatting. \
             Please save as a simple .xlsx with only text and numbers."
                .to_string(),
        )
    } else {
        Error::FileFormat(format!(
            "Unable to read the file ({message}). Please re-save it as a plain .xlsx \
             with columns: employee code, job title, years of experience, \
             performance rating, current salary, mid of scale."
        ))
    }
}

/// Tolerant string decoding; `None` for blank or undecodable cells
fn get_string(cells: &[Data], idx: usize, row_index: u32) -> Option<String> {
    let cell = cells.get(idx)?;
    match cell {
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(f) => Some(stringify_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        // Formula cells arrive as their cached results; ISO strings as-is
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::DateTime(dt) => Some(stringify_number(dt.as_f64())),
        Data::Empty => None,
        Data::Error(e) => {
            tracing::warn!(row_index, col = idx, cell_error = ?e, "Error cell, treating as blank");
            None
        }
    }
}

/// Tolerant numeric decoding; undecodable cells degrade to 0
fn get_numeric(cells: &[Data], idx: usize, row_index: u32) -> f64 {
    let Some(cell) = cells.get(idx) else {
        return 0.0;
    };
    match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => parse_loose_number(s),
        Data::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Data::DateTime(dt) => dt.as_f64(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => parse_loose_number(s),
        Data::Empty => 0.0,
        Data::Error(e) => {
            tracing::warn!(row_index, col = idx, cell_error = ?e, "Error cell, treating as 0");
            0.0
        }
    }
}

/// Parse a number out of free text: strip everything but digits, `.`, `-`;
/// empty after stripping means 0
fn parse_loose_number(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse().unwrap_or_else(|_| {
        tracing::warn!(text, "Unparseable numeric text, treating as 0");
        0.0
    })
}

fn stringify_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_numbers_strip_currency_noise() {
        assert_eq!(parse_loose_number("$1,234.50"), 1234.50);
        assert_eq!(parse_loose_number(" 42 "), 42.0);
        assert_eq!(parse_loose_number("-7"), -7.0);
        assert_eq!(parse_loose_number("n/a"), 0.0);
        assert_eq!(parse_loose_number(""), 0.0);
    }

    #[test]
    fn string_decoding_covers_mixed_cell_types() {
        let cells = vec![
            Data::String("  E001  ".to_string()),
            Data::Float(42.0),
            Data::Bool(true),
            Data::Empty,
            Data::Float(1.5),
        ];
        assert_eq!(get_string(&cells, 0, 1), Some("E001".to_string()));
        assert_eq!(get_string(&cells, 1, 1), Some("42".to_string()));
        assert_eq!(get_string(&cells, 2, 1), Some("true".to_string()));
        assert_eq!(get_string(&cells, 3, 1), None);
        assert_eq!(get_string(&cells, 4, 1), Some("1.5".to_string()));
        assert_eq!(get_string(&cells, 9, 1), None, "missing cell is blank");
    }

    #[test]
    fn numeric_decoding_covers_mixed_cell_types() {
        let cells = vec![
            Data::Float(50000.0),
            Data::String("60,000".to_string()),
            Data::Bool(true),
            Data::Empty,
        ];
        assert_eq!(get_numeric(&cells, 0, 1), 50000.0);
        assert_eq!(get_numeric(&cells, 1, 1), 60000.0);
        assert_eq!(get_numeric(&cells, 2, 1), 1.0);
        assert_eq!(get_numeric(&cells, 3, 1), 0.0);
        assert_eq!(get_numeric(&cells, 9, 1), 0.0, "missing cell is 0");
    }

    #[test]
    fn garbage_bytes_are_a_file_format_error() {
        let err = parse(b"this is not a workbook", ColumnLayout::standard()).unwrap_err();
        assert!(matches!(err, Error::FileFormat(_)));
    }

    #[test]
    fn layout_variant_shifts_columns() {
        let std = ColumnLayout::standard();
        let named = ColumnLayout::with_employee_name();
        assert_eq!(std.midpoint(), 5);
        assert_eq!(named.midpoint(), 6);
        assert_eq!(std.name(), None);
        assert_eq!(named.name(), Some(1));
    }
}
