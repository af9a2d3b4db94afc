/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Habit;
use crate::storage::{HabitStorage, StorageError};

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// Name of the habit (1-100 characters)
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Color tag, e.g. "#ff8800"
    pub color: Option<String>,
    /// Icon tag, e.g. "🏃"
    pub icon: Option<String>,
    /// Expected completions per day (default 1)
    pub frequency_per_day: Option<u32>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit_id: Option<String>,
    pub message: String,
}

/// Create a new habit and its empty completion record
pub fn create_habit<S: HabitStorage>(
    storage: &S,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, StorageError> {
    let habit = Habit::new(
        params.name,
        params.description,
        params.color,
        params.icon,
        params.frequency_per_day,
    )?;

    storage.create_habit(&habit)?;

    Ok(CreateHabitResponse {
        success: true,
        habit_id: Some(habit.id.to_string()),
        message: format!("✅ Created habit '{}'! Ready to start your streak!", habit.name),
    })
}
