pub mod error;
pub mod csv_io;
pub mod json_io;

pub use error::{ReportError, ReportResult};
pub use csv_io::{format_score, read_table, write_class_balance, write_column_summary, write_table};
pub use json_io::{load_json, save_json};
