/// Habit entity and related functionality
///
/// This module defines the Habit record as the store returns it, the shape
/// handed to the store on creation, and the partial update applied when a
/// habit is completed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{decide_completion, CompletionOutcome, DomainError, HabitId, UserId};

/// Longest accepted habit name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// A habit the user is building, with its current streak
///
/// `streak` is zero exactly when `last_completed_date` is `None`. Both fields
/// only change together, through a completion accepted by the streak engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier, assigned by the store
    pub id: HabitId,
    /// The user this habit belongs to
    pub owner_id: UserId,
    /// Display name (e.g., "Read for 15 minutes")
    pub name: String,
    /// Consecutive days completed
    pub streak: u32,
    /// Day of the most recent accepted completion
    pub last_completed_date: Option<NaiveDate>,
    /// Set by the store on creation
    pub created_at: DateTime<Utc>,
    /// Refreshed by the store on every update
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Run the streak engine against this habit's current state
    pub fn decide_completion(&self, today: NaiveDate) -> CompletionOutcome {
        decide_completion(self.streak, self.last_completed_date, today)
    }

    /// Whether the habit has already been completed on `day`
    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.last_completed_date == Some(day)
    }

    /// Apply a partial update and stamp `updated_at`
    ///
    /// Used by store implementations; callers never touch timestamps.
    pub fn apply(&mut self, changes: &HabitChanges, now: DateTime<Utc>) {
        if let Some(ref name) = changes.name {
            self.name = name.clone();
        }
        if let Some(streak) = changes.streak {
            self.streak = streak;
        }
        if let Some(last_completed_date) = changes.last_completed_date {
            self.last_completed_date = last_completed_date;
        }
        self.updated_at = now;
    }
}

/// A habit that has not been stored yet
///
/// The store assigns the ID and both timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub owner_id: UserId,
    pub name: String,
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl NewHabit {
    /// A fresh, never-completed habit with a validated name
    pub fn new(owner_id: UserId, name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            owner_id,
            name: normalize_name(name)?,
            streak: 0,
            last_completed_date: None,
        })
    }

    /// Turn into a stored record
    pub fn into_habit(self, id: HabitId, now: DateTime<Utc>) -> Habit {
        Habit {
            id,
            owner_id: self.owner_id,
            name: self.name,
            streak: self.streak,
            last_completed_date: self.last_completed_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields to change on an existing habit; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub streak: Option<u32>,
    pub last_completed_date: Option<Option<NaiveDate>>,
}

impl HabitChanges {
    /// The update written after an accepted completion
    pub fn completion(new_streak: u32, new_date: NaiveDate) -> Self {
        Self {
            name: None,
            streak: Some(new_streak),
            last_completed_date: Some(Some(new_date)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.streak.is_none() && self.last_completed_date.is_none()
    }
}

/// Validate a habit name and return it trimmed
pub fn normalize_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(DomainError::InvalidHabitName(
            "Habit name cannot be empty.".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidHabitName(format!(
            "Habit name cannot be longer than {} characters.",
            MAX_NAME_LEN
        )));
    }

    Ok(trimmed.to_string())
}
