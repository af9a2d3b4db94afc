/// Tools for backup and restore
///
/// Implements data_export and data_import. An import replaces every habit
/// and completion record with the contents of the document.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Snapshot;
use crate::storage::{HabitStorage, StorageError};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ExportParams {}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub snapshot: Snapshot,
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImportParams {
    /// Document produced by data_export: `{ habits, completions, exportDate, version }`
    #[schemars(with = "serde_json::Map<String, Value>")]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub habits_imported: usize,
    pub completion_days_imported: usize,
    pub message: String,
}

pub fn export_data<S: HabitStorage>(
    storage: &S,
    _params: ExportParams,
    now: DateTime<Utc>,
) -> Result<ExportResponse, StorageError> {
    let snapshot = storage.export_snapshot(now)?;
    let message = format!(
        "📦 Exported {} habits ({})",
        snapshot.habits.len(),
        snapshot.export_date
    );
    Ok(ExportResponse { success: true, snapshot, message })
}

pub fn import_data<S: HabitStorage>(
    storage: &S,
    params: ImportParams,
) -> Result<ImportResponse, StorageError> {
    let snapshot =
        Snapshot::from_import(&params.data).map_err(|e| StorageError::InvalidImport(e.to_string()))?;
    storage.import_snapshot(&snapshot)?;

    let completion_days_imported = snapshot
        .habits
        .iter()
        .filter_map(|h| snapshot.completions.get(&h.id))
        .map(Vec::len)
        .sum();

    Ok(ImportResponse {
        success: true,
        habits_imported: snapshot.habits.len(),
        completion_days_imported,
        message: format!(
            "📥 Imported {} habits and {} completed days",
            snapshot.habits.len(),
            completion_days_imported
        ),
    })
}
