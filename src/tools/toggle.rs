/// Tool for marking a habit done (or not done) on a day
///
/// This module implements the habit_toggle MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{current_streak, DateKey, HabitId};
use crate::storage::{HabitStorage, StorageError};
use crate::tools::day_or_today;

/// Parameters for toggling a completion
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleHabitParams {
    /// ID of the habit to toggle
    pub habit_id: String,
    /// Day to toggle: `YYYY-MM-DD`, an ISO timestamp, or epoch seconds/milliseconds.
    /// Defaults to today.
    #[schemars(with = "Option<String>")]
    pub date: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ToggleHabitResponse {
    pub success: bool,
    pub date: DateKey,
    /// True when the day is now marked complete
    pub completed: bool,
    pub current_streak: u32,
    pub message: String,
}

pub fn toggle_habit<S: HabitStorage>(
    storage: &S,
    params: ToggleHabitParams,
    today: NaiveDate,
) -> Result<ToggleHabitResponse, StorageError> {
    let habit_id = HabitId::from_string(&params.habit_id)?;
    let day = day_or_today(params.date.as_ref(), today)?;
    let habit = storage.get_habit(&habit_id)?;

    let completed = storage.toggle_completion(&habit_id, day)?;
    let record = storage.completion_dates(&habit_id)?;
    let streak = current_streak(&record.dates, today);

    let message = if completed {
        format!(
            "🔥 Marked '{}' done for {}. Current streak: {} day{}",
            habit.name,
            day,
            streak,
            if streak == 1 { "" } else { "s" }
        )
    } else {
        format!("↩️ Unmarked '{}' for {}", habit.name, day)
    };

    Ok(ToggleHabitResponse {
        success: true,
        date: day,
        completed,
        current_streak: streak,
        message,
    })
}
