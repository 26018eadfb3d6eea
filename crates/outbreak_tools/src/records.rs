//! Record file inspection.
//!
//! Reads the JSON table the server's record store writes and renders
//! one line per identity, without going through a runtime or the store
//! itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use outbreak_core::session::PersistId;
use outbreak_core::store::PersistentRecord;

/// Errors that can occur while reading a record file.
#[derive(Debug, Error)]
pub enum RecordFileError {
    /// Failed to read the file. Carries the path and the OS error text.
    #[error("IO error reading '{0}': {1}")]
    Io(String, String),

    /// The file is not a valid record table.
    #[error("Parse error in '{0}': {1}")]
    Parse(String, String),
}

/// Load a record file into an id-ordered table.
pub fn load_records(
    path: &Path,
) -> Result<BTreeMap<PersistId, PersistentRecord>, RecordFileError> {
    let content = fs::read_to_string(path)
        .map_err(|e| RecordFileError::Io(path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| RecordFileError::Parse(path.display().to_string(), e.to_string()))
}

/// Render one record as a single line for listing output.
#[must_use]
pub fn describe(id: PersistId, record: &PersistentRecord) -> String {
    let defender = record.defender_role.as_deref().unwrap_or("-");
    let infected = record.infected_role.as_deref().unwrap_or("-");
    let rebuy = if record.auto_rebuy { "on" } else { "off" };
    format!(
        "{id}: defender={defender} infected={infected} rebuy={rebuy} saved_items={}",
        record.loadout.purchase_list().len()
    )
}
