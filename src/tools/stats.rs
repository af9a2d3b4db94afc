/// Tool for the statistics dashboard
///
/// This module implements the habit_stats MCP tool. When the store cannot be
/// read the dashboard is still produced, over an empty snapshot, and the
/// response carries the storage error.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analytics::{AnalyticsEngine, Dashboard};
use crate::storage::{HabitStorage, StorageError};
use crate::tools::{day_or_today, load_snapshot};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatsParams {
    /// Day to compute statistics for (defaults to today)
    #[schemars(with = "Option<String>")]
    pub date: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub dashboard: Dashboard,
    /// Set when the store could not be read and the figures are empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

pub fn habit_stats<S: HabitStorage>(
    storage: &S,
    engine: &AnalyticsEngine,
    params: StatsParams,
    today: NaiveDate,
) -> Result<StatsResponse, StorageError> {
    let anchor = day_or_today(params.date.as_ref(), today)?.date();

    let (habits, raw, error) = match load_snapshot(storage) {
        Ok((habits, raw)) => (habits, raw, None),
        Err(e) => {
            tracing::warn!("Failed to load habits for statistics, showing empty figures: {}", e);
            (Vec::new(), Value::Object(Default::default()), Some(e.to_string()))
        }
    };

    let dashboard = engine.dashboard(&habits, &raw, anchor);
    let message = dashboard.summary_text(&habits);

    Ok(StatsResponse {
        success: error.is_none(),
        dashboard,
        error,
        message,
    })
}
