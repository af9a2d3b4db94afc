/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, CompletionRecord, Streak),
/// the DateKey normalizer every incoming date passes through, and the
/// backup snapshot format.

pub mod completion;
pub mod date_key;
pub mod habit;
pub mod snapshot;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use completion::*;
pub use date_key::*;
pub use habit::*;
pub use snapshot::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid habit id: '{0}'")]
    InvalidHabitId(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
