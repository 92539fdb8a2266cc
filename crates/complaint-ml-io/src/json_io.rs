use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{ReportError, ReportResult};

/// Save any serializable value as pretty-printed JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> ReportResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Load a value from a JSON file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> ReportResult<T> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ReportError::NotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
