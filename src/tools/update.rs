/// Tools for editing and deleting habits
///
/// Implements habit_update and habit_delete. Only the name and description
/// are editable; deleting removes the habit and its completion record.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::HabitId;
use crate::storage::{HabitStorage, StorageError};

/// Parameters for editing a habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    /// ID of the habit to edit
    pub habit_id: String,
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional)
    pub description: Option<String>,
}

/// Response from updating a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub message: String,
    pub updated_fields: Vec<String>,
}

/// Parameters for deleting a habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteHabitParams {
    /// ID of the habit to delete
    pub habit_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub success: bool,
    pub message: String,
}

pub fn update_habit<S: HabitStorage>(
    storage: &S,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, StorageError> {
    let habit_id = HabitId::from_string(&params.habit_id)?;
    let mut habit = storage.get_habit(&habit_id)?;

    let mut updated_fields = Vec::new();
    if params.name.is_some() {
        updated_fields.push("name".to_string());
    }
    if params.description.is_some() {
        updated_fields.push("description".to_string());
    }

    if updated_fields.is_empty() {
        return Ok(UpdateHabitResponse {
            success: true,
            message: format!("No changes requested for '{}'", habit.name),
            updated_fields,
        });
    }

    habit.update(params.name, params.description)?;
    storage.update_habit(&habit)?;

    Ok(UpdateHabitResponse {
        success: true,
        message: format!("✏️ Updated habit '{}' ({})", habit.name, updated_fields.join(", ")),
        updated_fields,
    })
}

pub fn delete_habit<S: HabitStorage>(
    storage: &S,
    params: DeleteHabitParams,
) -> Result<DeleteHabitResponse, StorageError> {
    let habit_id = HabitId::from_string(&params.habit_id)?;
    let habit = storage.get_habit(&habit_id)?;
    storage.delete_habit(&habit_id)?;

    Ok(DeleteHabitResponse {
        success: true,
        message: format!("🗑️ Deleted habit '{}' and its completion history", habit.name),
    })
}
