/// Storage layer for persisting habit data
///
/// Two collections are kept: habits, and one completion record per habit
/// holding the raw list of completed days. Reads hand the raw completions to
/// the analytics layer untouched so legacy shapes keep working.

pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use sqlite::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{CompletionRecord, DateKey, DomainError, Habit, HabitId, Snapshot};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Storage interface for habits and their completion records
pub trait HabitStorage {
    /// All habits in insertion order
    fn load_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// Object of habit id to the stored (raw) list of completed days
    fn load_completions(&self) -> Result<Value, StorageError>;

    /// Make the habit collection equal to `habits`
    ///
    /// Every habit gets a completion record; habits missing from the set are
    /// deleted together with their records.
    fn replace_habits(&self, habits: &[Habit]) -> Result<(), StorageError>;

    /// Make the completion collection equal to `completions`
    fn replace_completions(
        &self,
        completions: &BTreeMap<HabitId, Vec<DateKey>>,
    ) -> Result<(), StorageError>;

    /// Insert a habit and its empty completion record
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Delete a habit and its completion record in one transaction
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// Normalized completion record for one habit
    fn completion_dates(&self, habit_id: &HabitId) -> Result<CompletionRecord, StorageError>;

    fn set_completion_dates(&self, habit_id: &HabitId, dates: &[DateKey]) -> Result<(), StorageError>;

    /// Flip one day, returning true when the day is now complete
    fn toggle_completion(&self, habit_id: &HabitId, day: DateKey) -> Result<bool, StorageError>;

    /// Capture everything as a backup document
    fn export_snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot, StorageError> {
        let habits = self.load_habits()?;
        let mut completions = BTreeMap::new();
        for habit in &habits {
            completions.insert(habit.id.clone(), self.completion_dates(&habit.id)?.to_vec());
        }
        Ok(Snapshot::new(habits, completions, now))
    }

    /// Replace everything with the contents of `snapshot`
    fn import_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.replace_habits(&snapshot.habits)?;
        self.replace_completions(&snapshot.completions)
    }
}
