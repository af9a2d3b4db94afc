/// Tool for listing all habits
///
/// This module implements the habit_list MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{build_completion_sets, lifetime_rates};
use crate::domain::{current_streak, DateKey};
use crate::storage::{HabitStorage, StorageError};
use crate::tools::load_snapshot;

/// Parameters for listing habits
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    /// Sort by: "created" (default), "name", "streak", "completion_rate"
    pub sort_by: Option<String>,
}

/// Information about a habit in the list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub frequency_per_day: u32,
    pub created_on: DateKey,
    pub completed_today: bool,
    pub current_streak: u32,
    /// Lifetime completion rate in percent
    pub completion_rate: u32,
    pub total_completions: usize,
}

#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitSummary>,
    pub completed_today: usize,
}

impl ListHabitsResponse {
    /// Human-readable listing for tool output
    pub fn to_text(&self) -> String {
        if self.habits.is_empty() {
            return "No habits found. Create your first habit to get started!".to_string();
        }

        let header = format!(
            "📋 **Habit Summary** ({} habits, {} done today)\n\n",
            self.habits.len(),
            self.completed_today
        );
        let lines = self
            .habits
            .iter()
            .map(|h| {
                format!(
                    "{} {} **{}**\n   🔥 Streak: {} days | 📊 Rate: {}% | ✅ Total: {}\n   ID: {}",
                    if h.completed_today { "☑️" } else { "⬜" },
                    if h.icon.is_empty() { "🎯" } else { h.icon.as_str() },
                    h.name,
                    h.current_streak,
                    h.completion_rate,
                    h.total_completions,
                    h.habit_id
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("{}{}", header, lines)
    }
}

pub fn list_habits<S: HabitStorage>(
    storage: &S,
    params: ListHabitsParams,
    today: NaiveDate,
) -> Result<ListHabitsResponse, StorageError> {
    let (habits, raw) = load_snapshot(storage)?;
    let sets = build_completion_sets(&habits, &raw);
    let rates = lifetime_rates(&habits, &sets, today);
    let today_key = DateKey::new(today);

    let mut summaries: Vec<HabitSummary> = habits
        .iter()
        .map(|habit| {
            let set = sets.get(&habit.id);
            let completion_rate = rates
                .iter()
                .find(|r| r.habit_id == habit.id)
                .map(|r| r.rate)
                .unwrap_or(0);
            HabitSummary {
                habit_id: habit.id.to_string(),
                name: habit.name.clone(),
                description: habit.description.clone(),
                icon: habit.icon.clone(),
                color: habit.color.clone(),
                frequency_per_day: habit.frequency_per_day,
                created_on: DateKey::new(habit.created_on()),
                completed_today: set.is_some_and(|s| s.contains(&today_key)),
                current_streak: set.map(|s| current_streak(s, today)).unwrap_or(0),
                completion_rate,
                total_completions: set.map(|s| s.len()).unwrap_or(0),
            }
        })
        .collect();

    match params.sort_by.as_deref().map(str::trim) {
        None | Some("") | Some("created") => {}
        Some("name") => summaries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        Some("streak") => summaries.sort_by(|a, b| b.current_streak.cmp(&a.current_streak)),
        Some("completion_rate") => summaries.sort_by(|a, b| b.completion_rate.cmp(&a.completion_rate)),
        Some(other) => {
            return Err(StorageError::Domain(crate::domain::DomainError::Validation {
                message: format!(
                    "Invalid sort_by '{}'. Valid options: created, name, streak, completion_rate",
                    other
                ),
            }))
        }
    }

    let completed_today = summaries.iter().filter(|h| h.completed_today).count();
    Ok(ListHabitsResponse { habits: summaries, completed_today })
}
