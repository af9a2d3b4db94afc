/// Analytics over a snapshot of habits and completions
///
/// The submodules are pure functions over `&[Habit]` and completion sets.
/// `AnalyticsEngine` wires them together with the configured window sizes.

pub mod calendar;
pub mod completion_sets;
pub mod dashboard;
pub mod rates;

pub use calendar::*;
pub use completion_sets::*;
pub use dashboard::*;
pub use rates::*;

use chrono::NaiveDate;
use serde_json::Value;

use crate::config::AnalyticsConfig;
use crate::domain::{DomainError, Habit};

/// Analytics engine holding the window sizes used for aggregate rates
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Compute every dashboard metric from raw stored completions
    pub fn dashboard(&self, habits: &[Habit], raw_completions: &Value, today: NaiveDate) -> Dashboard {
        let sets = build_completion_sets(habits, raw_completions);
        Dashboard::compute(
            habits,
            &sets,
            today,
            self.config.rolling_window_days,
            self.config.top_habits,
        )
    }

    /// Heat map for one month
    pub fn calendar(
        &self,
        habits: &[Habit],
        raw_completions: &Value,
        year: i32,
        month: u32,
    ) -> Result<CalendarMonth, DomainError> {
        let sets = build_completion_sets(habits, raw_completions);
        calendar_month(habits, &sets, year, month)
    }
}
