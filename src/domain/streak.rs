/// Streak engine: the daily completion decision
///
/// Given a habit's prior completion state and the current calendar day, this
/// decides whether a completion extends the streak, restarts it, or is a
/// repeat for the same day. It is a pure function of its inputs; the caller
/// supplies "today" and performs any persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Notice, NoticeKind};

/// Classification of a completion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    AlreadyCompletedToday,
    FirstCompletion,
    StreakExtended,
    StreakReset,
}

/// New streak state produced by an accepted completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakChange {
    pub new_streak: u32,
    pub new_date: NaiveDate,
}

/// Result of [`decide_completion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Already completed on this day; nothing changes and nothing is written
    AlreadyCompletedToday,
    /// Never completed before; the streak starts at 1
    FirstCompletion(StreakChange),
    /// Last completed yesterday; the streak grows by one
    StreakExtended(StreakChange),
    /// Any other gap; the streak restarts at 1
    StreakReset(StreakChange),
}

impl CompletionOutcome {
    pub fn kind(&self) -> CompletionKind {
        match self {
            CompletionOutcome::AlreadyCompletedToday => CompletionKind::AlreadyCompletedToday,
            CompletionOutcome::FirstCompletion(_) => CompletionKind::FirstCompletion,
            CompletionOutcome::StreakExtended(_) => CompletionKind::StreakExtended,
            CompletionOutcome::StreakReset(_) => CompletionKind::StreakReset,
        }
    }

    /// The state to persist, if any
    pub fn change(&self) -> Option<StreakChange> {
        match self {
            CompletionOutcome::AlreadyCompletedToday => None,
            CompletionOutcome::FirstCompletion(change)
            | CompletionOutcome::StreakExtended(change)
            | CompletionOutcome::StreakReset(change) => Some(*change),
        }
    }

    pub fn requires_write(&self) -> bool {
        self.change().is_some()
    }

    /// The notice to show once the outcome has been applied
    pub fn notice(&self) -> Notice {
        match self {
            CompletionOutcome::AlreadyCompletedToday => Notice::new(
                NoticeKind::AlreadyDone,
                "You've already completed this today!",
            ),
            CompletionOutcome::FirstCompletion(_) => Notice::new(
                NoticeKind::FirstCompletion,
                "First completion! Streak started at 1.",
            ),
            CompletionOutcome::StreakExtended(change) => Notice::new(
                NoticeKind::Extended,
                format!("Streak increased to {}! Keep it up!", change.new_streak),
            ),
            CompletionOutcome::StreakReset(_) => Notice::new(
                NoticeKind::Reset,
                "Streak reset to 1. A new beginning!",
            ),
        }
    }
}

/// Decide what completing a habit on `today` does to its streak
///
/// A gap of exactly one day extends the streak. Every other gap, including a
/// negative one from a clock that went backwards, restarts it at 1.
pub fn decide_completion(
    streak: u32,
    last_completed_date: Option<NaiveDate>,
    today: NaiveDate,
) -> CompletionOutcome {
    let last = match last_completed_date {
        Some(last) if last == today => return CompletionOutcome::AlreadyCompletedToday,
        Some(last) => last,
        None => {
            return CompletionOutcome::FirstCompletion(StreakChange {
                new_streak: 1,
                new_date: today,
            })
        }
    };

    let gap_days = today.signed_duration_since(last).num_days();
    if gap_days == 1 {
        CompletionOutcome::StreakExtended(StreakChange {
            new_streak: streak.saturating_add(1),
            new_date: today,
        })
    } else {
        CompletionOutcome::StreakReset(StreakChange {
            new_streak: 1,
            new_date: today,
        })
    }
}
