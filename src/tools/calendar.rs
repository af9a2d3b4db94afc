/// Tool for the monthly calendar heat map
///
/// This module implements the habit_calendar MCP tool.

use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{shift_month, AnalyticsEngine, CalendarMonth};
use crate::domain::DomainError;
use crate::storage::{HabitStorage, StorageError};
use crate::tools::load_snapshot;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CalendarParams {
    /// Year to show (defaults to the current year)
    pub year: Option<i32>,
    /// Month to show, 1-12 (defaults to the current month)
    pub month: Option<u32>,
    /// Months to move from the selected month, e.g. -1 for the previous one
    pub offset: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub success: bool,
    pub calendar: CalendarMonth,
    pub message: String,
}

pub fn habit_calendar<S: HabitStorage>(
    storage: &S,
    engine: &AnalyticsEngine,
    params: CalendarParams,
    today: NaiveDate,
) -> Result<CalendarResponse, StorageError> {
    let year = params.year.unwrap_or_else(|| today.year());
    let month = params.month.unwrap_or_else(|| today.month());
    let (year, month) = shift_month(year, month, params.offset.unwrap_or(0))
        .ok_or_else(|| DomainError::InvalidDate(format!("no such month: {}-{:02}", year, month)))?;

    let (habits, raw) = load_snapshot(storage)?;
    let calendar = engine.calendar(&habits, &raw, year, month)?;
    let message = format!(
        "📅 {}-{:02} ({} habits)\n{}\n# all done  + some done  . none",
        year,
        month,
        habits.len(),
        calendar.render_text()
    );

    Ok(CalendarResponse { success: true, calendar, message })
}
