/// Storage layer for persisting habits and accounts
///
/// The rest of the crate talks to storage through the `HabitStore` and
/// `AccountStore` traits. `SqliteStorage` is the durable implementation;
/// `MemoryStorage` keeps everything in process and can be told to fail.

pub mod memory;
pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Account, Habit, HabitChanges, HabitId, NewHabit, ResetToken, UserId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Account not found: {user_id}")]
    AccountNotFound { user_id: String },

    #[error("An account with email {email} already exists")]
    DuplicateAccount { email: String },

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// The record store for habits
///
/// Every call is scoped to an owner. Asking for a habit that belongs to
/// someone else behaves exactly like asking for one that does not exist.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// All habits owned by `owner`, newest first
    async fn list(&self, owner: &UserId) -> Result<Vec<Habit>, StorageError>;

    /// Store a new habit; the store assigns its ID and timestamps
    async fn create(&self, habit: NewHabit) -> Result<Habit, StorageError>;

    /// Apply `changes` to one habit and return the stored result
    async fn update(
        &self,
        owner: &UserId,
        id: &HabitId,
        changes: HabitChanges,
    ) -> Result<Habit, StorageError>;

    /// Remove a habit permanently
    async fn delete(&self, owner: &UserId, id: &HabitId) -> Result<(), StorageError>;
}

/// Persistence for local accounts and password resets
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; fails with `DuplicateAccount` if the email is taken
    async fn insert_account(&self, account: &Account) -> Result<(), StorageError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError>;

    async fn find_account(&self, id: &UserId) -> Result<Option<Account>, StorageError>;

    /// Replace the stored password hash
    async fn set_password(&self, id: &UserId, hash: &str) -> Result<(), StorageError>;

    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StorageError>;

    /// Consume a reset token, returning its owner if it was valid at `now`
    ///
    /// A token can be taken at most once.
    async fn take_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError>;
}
