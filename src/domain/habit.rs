/// Habit entity and related functionality
///
/// This module defines the core Habit struct that represents something a
/// user wants to do every day, along with its validation rules.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, HabitId};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_FREQUENCY_PER_DAY: u32 = 100;

/// A habit represents something the user wants to do regularly
///
/// Field names serialize in camelCase so exported snapshots keep the shape
/// older clients wrote (`createdAt`, `frequencyPerDay`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Free-text description, empty when not given
    #[serde(default)]
    pub description: String,
    /// When this habit was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Color tag picked at creation
    #[serde(default)]
    pub color: String,
    /// Icon tag picked at creation
    #[serde(default)]
    pub icon: String,
    /// Expected completions per day, the divisor of the lifetime rate
    #[serde(default = "default_frequency_per_day")]
    pub frequency_per_day: u32,
}

fn default_frequency_per_day() -> u32 {
    1
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// The id is generated and `created_at` is set to now.
    pub fn new(
        name: String,
        description: Option<String>,
        color: Option<String>,
        icon: Option<String>,
        frequency_per_day: Option<u32>,
    ) -> Result<Self, DomainError> {
        let description = description.unwrap_or_default();
        let frequency_per_day = frequency_per_day.unwrap_or_else(default_frequency_per_day);

        Self::validate_name(&name)?;
        Self::validate_description(&description)?;
        Self::validate_frequency(frequency_per_day)?;

        Ok(Self {
            id: HabitId::new(),
            name: name.trim().to_string(),
            description,
            created_at: Utc::now(),
            color: color.unwrap_or_default(),
            icon: icon.unwrap_or_default(),
            frequency_per_day,
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated.
    pub fn from_existing(
        id: HabitId,
        name: String,
        description: String,
        created_at: DateTime<Utc>,
        color: String,
        icon: String,
        frequency_per_day: u32,
    ) -> Self {
        Self {
            id,
            name,
            description,
            created_at,
            color,
            icon,
            frequency_per_day,
        }
    }

    /// Edit the habit; only name and description are editable
    pub fn update(
        &mut self,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(ref new_name) = name {
            Self::validate_name(new_name)?;
        }
        if let Some(ref new_desc) = description {
            Self::validate_description(new_desc)?;
        }

        if let Some(new_name) = name {
            self.name = new_name.trim().to_string();
        }
        if let Some(new_description) = description {
            self.description = new_description;
        }

        Ok(())
    }

    /// Local calendar day the habit was created on
    pub fn created_on(&self) -> NaiveDate {
        self.created_on_in(&Local)
    }

    pub fn created_on_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }

    /// Check fields that `from_existing` and deserialization skip
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidHabitId(self.id.to_string()));
        }
        Self::validate_name(&self.name)?;
        Self::validate_description(&self.description)?;
        Self::validate_frequency(self.frequency_per_day)
    }

    // Validation helper methods

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::InvalidHabitName(
                format!("Habit name cannot be longer than {} characters", MAX_NAME_LEN)
            ));
        }

        Ok(())
    }

    fn validate_description(description: &str) -> Result<(), DomainError> {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::Validation {
                message: format!("Description cannot be longer than {} characters", MAX_DESCRIPTION_LEN)
            });
        }
        Ok(())
    }

    fn validate_frequency(frequency_per_day: u32) -> Result<(), DomainError> {
        if frequency_per_day == 0 || frequency_per_day > MAX_FREQUENCY_PER_DAY {
            return Err(DomainError::InvalidFrequency(format!(
                "frequencyPerDay must be between 1 and {}, got {}",
                MAX_FREQUENCY_PER_DAY, frequency_per_day
            )));
        }
        Ok(())
    }
}
