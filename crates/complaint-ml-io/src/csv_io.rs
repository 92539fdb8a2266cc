use complaint_ml_data::ColumnSummary;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{ReportError, ReportResult};

/// Scores are written with three decimals.
pub fn format_score(v: f64) -> String {
    format!("{:.3}", v)
}

/// Write a header row followed by string rows, creating parent directories.
pub fn write_table<P: AsRef<Path>, S: AsRef<str>>(
    path: P,
    headers: &[S],
    rows: &[Vec<String>],
) -> ReportResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers.iter().map(|h| h.as_ref()))?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Read a CSV written by [`write_table`] back as headers and string rows.
pub fn read_table<P: AsRef<Path>>(path: P) -> ReportResult<(Vec<String>, Vec<Vec<String>>)> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ReportError::NotFound(path.to_path_buf()));
    }
    let mut rdr = csv::Reader::from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result?.iter().map(|f| f.to_string()).collect());
    }
    Ok((headers, rows))
}

/// Label value counts, one row per value.
pub fn write_class_balance<P: AsRef<Path>>(
    path: P,
    label: &str,
    counts: &[(String, usize)],
) -> ReportResult<()> {
    let rows: Vec<Vec<String>> = counts
        .iter()
        .map(|(value, count)| vec![value.clone(), count.to_string()])
        .collect();
    write_table(path, &[label, "count"], &rows)
}

/// Valid and unique value counts per column.
pub fn write_column_summary<P: AsRef<Path>>(path: P, summary: &[ColumnSummary]) -> ReportResult<()> {
    let rows: Vec<Vec<String>> = summary
        .iter()
        .map(|s| vec![s.column.clone(), s.valid_count.to_string(), s.unique_count.to_string()])
        .collect();
    write_table(path, &["column", "valid_count", "unique_count"], &rows)
}
