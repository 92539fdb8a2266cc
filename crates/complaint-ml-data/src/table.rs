use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::error::{DataError, DataResult};

/// A single cell of a complaint table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{:.0}", v),
            Value::Number(v) => write!(f, "{}", v),
            Value::Date(d) if d.time().num_seconds_from_midnight() == 0 => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    /// Empty strings become `Missing`.
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Value::Missing
        } else {
            Value::Text(s.to_string())
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Number(v)
        }
    }
}

/// Column-oriented table with named, equally long columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    n_rows: usize,
}

impl Table {
    /// Build a table from named columns. Names must be unique and columns equally long.
    pub fn new(names: Vec<String>, columns: Vec<Vec<Value>>) -> DataResult<Self> {
        if names.len() != columns.len() {
            return Err(DataError::InvalidArgument(format!(
                "{} column names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateColumn(name.clone()));
            }
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        for (name, col) in names.iter().zip(&columns) {
            if col.len() != n_rows {
                return Err(DataError::LengthMismatch {
                    column: name.clone(),
                    expected: n_rows,
                    got: col.len(),
                });
            }
        }
        Ok(Table { names, columns, n_rows })
    }

    /// Convenience constructor from string cells (empty strings are missing).
    pub fn from_str_columns(columns: &[(&str, Vec<&str>)]) -> DataResult<Self> {
        let names = columns.iter().map(|(n, _)| n.to_string()).collect();
        let values = columns
            .iter()
            .map(|(_, cells)| cells.iter().map(|c| Value::from(*c)).collect())
            .collect();
        Table::new(names, values)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Like [`Table::column`], failing with `MissingColumn`.
    pub fn require_column(&self, name: &str) -> DataResult<&[Value]> {
        self.column(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    /// Replace or append a column.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> DataResult<()> {
        if !self.names.is_empty() && values.len() != self.n_rows {
            return Err(DataError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                got: values.len(),
            });
        }
        if self.names.is_empty() {
            self.n_rows = values.len();
        }
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Copy of the table without the named columns. Unknown names are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, drop: &[S]) -> Table {
        let mut names = Vec::new();
        let mut columns = Vec::new();
        for (name, col) in self.names.iter().zip(&self.columns) {
            if drop.iter().any(|d| d.as_ref() == name) {
                continue;
            }
            names.push(name.clone());
            columns.push(col.clone());
        }
        Table {
            names,
            columns,
            n_rows: self.n_rows,
        }
    }

    /// Gather rows by index, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> DataResult<Table> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(DataError::InvalidArgument(format!(
                "row index {} out of bounds for {} rows",
                bad, self.n_rows
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
            .collect();
        Ok(Table {
            names: self.names.clone(),
            columns,
            n_rows: indices.len(),
        })
    }

    /// Whether any cell of row `i` is missing.
    pub fn row_has_missing(&self, i: usize) -> bool {
        self.columns.iter().any(|col| col[i].is_missing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_str_columns(&[
            ("product", vec!["Mortgage", "Credit card", ""]),
            ("state", vec!["CA", "NY", "TX"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_basics() {
        let t = sample();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.n_cols(), 2);
        assert_eq!(t.column("state").unwrap()[1], Value::Text("NY".into()));
        assert!(t.column("zip").is_none());
        assert!(matches!(t.require_column("zip"), Err(DataError::MissingColumn(_))));
        assert!(t.row_has_missing(2));
        assert!(!t.row_has_missing(0));
    }

    #[test]
    fn test_rejects_ragged_and_duplicate_columns() {
        let ragged = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Value::Missing], vec![]],
        );
        assert!(matches!(ragged, Err(DataError::LengthMismatch { .. })));

        let dup = Table::new(vec!["a".into(), "a".into()], vec![vec![], vec![]]);
        assert!(matches!(dup, Err(DataError::DuplicateColumn(_))));
    }

    #[test]
    fn test_drop_and_select() {
        let t = sample();
        let d = t.drop_columns(&["product", "unknown"]);
        assert_eq!(d.column_names(), &["state".to_string()]);
        assert_eq!(d.n_rows(), 3);
        assert_eq!(t.drop_columns(&["product", "state"]).n_rows(), 3);

        let s = t.select_rows(&[2, 0]).unwrap();
        assert_eq!(s.n_rows(), 2);
        assert_eq!(s.column("state").unwrap()[0], Value::Text("TX".into()));
        assert!(t.select_rows(&[3]).is_err());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(90210.0).to_string(), "90210");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Missing.to_string(), "");
        let d = chrono::NaiveDate::from_ymd_opt(2015, 3, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::Date(d).to_string(), "2015-03-02");
    }
}
