use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{DataError, DataResult};
use crate::table::{Table, Value};

/// Column coerced to numeric after loading.
pub const ZIP_CODE_COLUMN: &str = "zip_code";

/// Cells treated as missing on read.
const NA_VALUES: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
// `%Y` also accepts two-digit years, so the `%y` form is tried first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

/// How many data rows to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLimit {
    #[default]
    All,
    Count(usize),
}

impl FromStr for RowLimit {
    type Err = DataError;

    /// Accepts `"all"` or a non-negative integer.
    fn from_str(s: &str) -> DataResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RowLimit::All);
        }
        s.parse::<usize>().map(RowLimit::Count).map_err(|_| {
            DataError::InvalidArgument(format!(
                "expected row limit as 'all' or a non-negative integer, got {:?}",
                s
            ))
        })
    }
}

/// Parse a skip-row offset; must be a non-negative integer.
pub fn parse_skip_rows(s: &str) -> DataResult<usize> {
    s.trim().parse::<usize>().map_err(|_| {
        DataError::InvalidArgument(format!(
            "expected skip rows as a non-negative integer, got {:?}",
            s
        ))
    })
}

/// Canonical column name: lowercase, spaces and hyphens to underscores, no `?`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('?', "")
        .replace('-', "_")
}

/// Read a complaints CSV and clean up column names and cell types.
///
/// `skip_rows` data rows after the header are skipped, then at most `rows`
/// rows are read. Date columns (name contains `date`) are parsed and the
/// zip code column is coerced to numeric; bad cells in either become
/// [`Value::Missing`].
pub fn load_complaints<P: AsRef<Path>>(
    path: P,
    rows: RowLimit,
    skip_rows: usize,
) -> DataResult<Table> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let names: Vec<String> = rdr.headers()?.iter().map(normalize_column_name).collect();

    let limit = match rows {
        RowLimit::All => usize::MAX,
        RowLimit::Count(n) => n,
    };

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for result in rdr.records().skip(skip_rows).take(limit) {
        let record = result?;
        for (j, field) in record.iter().enumerate() {
            raw[j].push(field.to_string());
        }
    }

    let columns: Vec<Vec<Value>> = names
        .iter()
        .zip(raw)
        .map(|(name, cells)| coerce_column(name, &cells))
        .collect();
    let table = Table::new(names, columns)?;

    info!(
        path = %path.display(),
        rows = table.n_rows(),
        columns = table.n_cols(),
        "Loaded complaints table"
    );
    Ok(table)
}

fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

fn coerce_column(name: &str, cells: &[String]) -> Vec<Value> {
    if name.contains("date") {
        debug!(column = name, "Parsing date column");
        return cells.iter().map(|c| parse_date(c)).collect();
    }
    if name == ZIP_CODE_COLUMN {
        return cells.iter().map(|c| parse_number(c)).collect();
    }

    let numeric = cells
        .iter()
        .filter(|c| !is_na(c))
        .all(|c| c.trim().parse::<f64>().is_ok());
    let any_value = cells.iter().any(|c| !is_na(c));
    if numeric && any_value {
        cells.iter().map(|c| parse_number(c)).collect()
    } else {
        cells
            .iter()
            .map(|c| if is_na(c) { Value::Missing } else { Value::Text(c.clone()) })
            .collect()
    }
}

fn parse_number(cell: &str) -> Value {
    if is_na(cell) {
        return Value::Missing;
    }
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Number(v),
        _ => Value::Missing,
    }
}

fn parse_date(cell: &str) -> Value {
    let cell = cell.trim();
    if is_na(cell) {
        return Value::Missing;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Value::Date(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Some(dt) = NaiveDate::parse_from_str(cell, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Value::Date(dt);
        }
    }
    match DateTime::parse_from_rfc3339(cell) {
        Ok(dt) => Value::Date(dt.naive_utc()),
        Err(_) => Value::Missing,
    }
}
