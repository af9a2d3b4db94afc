/// MCP tools for habit management
///
/// Each tool is a plain function over a `HabitStorage`. Parameter structs
/// derive `JsonSchema` so the server can publish their input schemas, and
/// "today" is always passed in by the caller.

pub mod calendar;
pub mod create;
pub mod data;
pub mod list;
pub mod stats;
pub mod toggle;
pub mod update;

// Re-export tool functions for easy access
pub use calendar::*;
pub use create::*;
pub use data::*;
pub use list::*;
pub use stats::*;
pub use toggle::*;
pub use update::*;

use serde_json::Value;

use crate::domain::{normalize, DateKey, DomainError, Habit};
use crate::storage::{HabitStorage, StorageError};

/// Habits plus the raw completions collection, read together
pub fn load_snapshot<S: HabitStorage>(storage: &S) -> Result<(Vec<Habit>, Value), StorageError> {
    let habits = storage.load_habits()?;
    let completions = storage.load_completions()?;
    Ok((habits, completions))
}

/// Resolve an optional date argument, falling back to `today`
pub(crate) fn day_or_today(date: Option<&Value>, today: chrono::NaiveDate) -> Result<DateKey, DomainError> {
    match date {
        None | Some(Value::Null) => Ok(DateKey::from(today)),
        Some(value) => normalize(value).ok_or_else(|| {
            DomainError::InvalidDate(format!("cannot read {} as a day", value))
        }),
    }
}
