/// Backup/restore document
///
/// `{ habits, completions: { habitId: [dates] }, exportDate, version: "1.0" }`

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analytics::completion_sets::entry_days;
use crate::domain::{DateKey, DomainError, Habit, HabitId};

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub habits: Vec<Habit>,
    pub completions: BTreeMap<HabitId, Vec<DateKey>>,
    pub export_date: String,
    pub version: String,
}

impl Snapshot {
    pub fn new(
        habits: Vec<Habit>,
        completions: BTreeMap<HabitId, Vec<DateKey>>,
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            habits,
            completions,
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    /// The state used when nothing could be loaded
    pub fn empty(exported_at: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), BTreeMap::new(), exported_at)
    }

    /// Parse an imported document
    ///
    /// `habits` must be an array and `completions` an object. Completion
    /// values that are not arrays become empty lists. Entries are read like
    /// stored ones (bare dates or objects with a date field) and dates that do
    /// not normalize are dropped. A missing `exportDate`/`version` is tolerated.
    pub fn from_import(document: &Value) -> Result<Self, DomainError> {
        let habits_value = document.get("habits").filter(|v| v.is_array()).ok_or_else(|| {
            DomainError::Validation { message: "invalid format: habits must be an array".to_string() }
        })?;
        let completions_value = document.get("completions").and_then(Value::as_object).ok_or_else(|| {
            DomainError::Validation { message: "invalid format: completions must be an object".to_string() }
        })?;

        let habits: Vec<Habit> = serde_json::from_value(habits_value.clone())
            .map_err(|e| DomainError::Validation { message: format!("invalid habit: {}", e) })?;
        for habit in &habits {
            habit.validate()?;
        }

        let mut completions = BTreeMap::new();
        for (habit_id, dates) in completions_value {
            let keys = dates.as_array().map(|entries| entry_days(entries)).unwrap_or_default();
            completions.insert(HabitId::from_string(habit_id)?, keys.into_iter().collect());
        }

        let export_date = document
            .get("exportDate")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = document
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(SNAPSHOT_VERSION)
            .to_string();

        Ok(Self { habits, completions, export_date, version })
    }
}
