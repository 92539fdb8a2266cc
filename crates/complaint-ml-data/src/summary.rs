use std::collections::{BTreeMap, HashSet};

use crate::error::DataResult;
use crate::table::Table;

/// Valid (non-missing) and distinct value counts of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub column: String,
    pub valid_count: usize,
    pub unique_count: usize,
}

/// Count rows per value of `column`, missing cells excluded, sorted by value.
pub fn class_balance(table: &Table, column: &str) -> DataResult<Vec<(String, usize)>> {
    let values = table.require_column(column)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in values.iter().filter(|v| !v.is_missing()) {
        *counts.entry(v.to_string()).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Per-column valid and unique counts, in column order.
pub fn column_summary(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .map(|(name, values)| {
            let valid: Vec<String> = values
                .iter()
                .filter(|v| !v.is_missing())
                .map(|v| v.to_string())
                .collect();
            let unique: HashSet<&str> = valid.iter().map(String::as_str).collect();
            ColumnSummary {
                column: name.to_string(),
                valid_count: valid.len(),
                unique_count: unique.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_str_columns(&[
            ("consumer_disputed", vec!["No", "Yes", "No", "", "No"]),
            ("state", vec!["CA", "CA", "", "NY", "TX"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_class_balance() {
        let counts = class_balance(&sample(), "consumer_disputed").unwrap();
        assert_eq!(counts, vec![("No".to_string(), 3), ("Yes".to_string(), 1)]);
        assert!(class_balance(&sample(), "nope").is_err());
    }

    #[test]
    fn test_column_summary() {
        let summary = column_summary(&sample());
        assert_eq!(summary.len(), 2);
        assert_eq!(
            summary[1],
            ColumnSummary {
                column: "state".into(),
                valid_count: 4,
                unique_count: 3,
            }
        );
    }
}
