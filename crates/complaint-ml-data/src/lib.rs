pub mod error;
pub mod table;
pub mod loader;
pub mod prepare;
pub mod summary;

pub use error::{DataError, DataResult};
pub use table::{Table, Value};
pub use loader::{load_complaints, normalize_column_name, parse_skip_rows, RowLimit};
pub use prepare::{prepare_dataset, train_test_split, LabeledData};
pub use summary::{class_balance, column_summary, ColumnSummary};
