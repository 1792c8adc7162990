/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Account), the streak engine
/// that decides what a daily completion does, the calendar-day policy that
/// feeds it, and the notices operations hand back to callers.

pub mod account;
pub mod calendar;
pub mod habit;
pub mod notice;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use account::*;
pub use calendar::*;
pub use habit::*;
pub use notice::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{0}")]
    InvalidHabitName(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
