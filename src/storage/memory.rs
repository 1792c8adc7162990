/// In-process storage
///
/// Keeps habits and accounts in memory behind a mutex. Besides serving
/// ephemeral sessions it records how many reads and writes it has seen and
/// can be switched into a failing mode, which is how controller behaviour on
/// store errors is exercised.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, Habit, HabitChanges, HabitId, NewHabit, ResetToken, UserId};
use crate::storage::{AccountStore, HabitStore, StorageError};

#[derive(Default)]
struct MemoryState {
    /// Insertion order; listing walks it backwards to get newest first
    habits: Vec<Habit>,
    accounts: Vec<Account>,
    resets: HashMap<String, (ResetToken, bool)>,
    reads: usize,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// Thread-safe in-memory `HabitStore` and `AccountStore`
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_write(state: &mut MemoryState) -> Result<(), StorageError> {
        state.writes += 1;
        if state.fail_writes {
            return Err(StorageError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

/// Test helpers
///
/// Failure switches, call counters and direct seeding. The server never
/// calls these; they exist so controller and gateway tests can observe and
/// break the store.
impl MemoryStorage {
    /// Make every subsequent habit read fail until switched back
    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// Make every subsequent habit write fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Number of habit list calls seen, including failed ones
    pub fn read_count(&self) -> usize {
        self.state().reads
    }

    /// Number of habit create/update/delete calls seen, including failed ones
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Snapshot of every stored habit regardless of owner
    pub fn all_habits(&self) -> Vec<Habit> {
        self.state().habits.clone()
    }

    /// Seed a habit directly, bypassing the write counter
    pub fn insert_habit(&self, habit: Habit) {
        self.state().habits.push(habit);
    }
}

#[async_trait]
impl HabitStore for MemoryStorage {
    async fn list(&self, owner: &UserId) -> Result<Vec<Habit>, StorageError> {
        let mut state = self.state();
        state.reads += 1;
        if state.fail_reads {
            return Err(StorageError::Unavailable("read rejected".to_string()));
        }

        Ok(state
            .habits
            .iter()
            .rev()
            .filter(|h| &h.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, habit: NewHabit) -> Result<Habit, StorageError> {
        let mut state = self.state();
        Self::begin_write(&mut state)?;

        let habit = habit.into_habit(HabitId::new(), Utc::now());
        state.habits.push(habit.clone());
        Ok(habit)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &HabitId,
        changes: HabitChanges,
    ) -> Result<Habit, StorageError> {
        let mut state = self.state();
        Self::begin_write(&mut state)?;

        let habit = state
            .habits
            .iter_mut()
            .find(|h| &h.id == id && &h.owner_id == owner)
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: id.to_string(),
            })?;

        habit.apply(&changes, Utc::now());
        Ok(habit.clone())
    }

    async fn delete(&self, owner: &UserId, id: &HabitId) -> Result<(), StorageError> {
        let mut state = self.state();
        Self::begin_write(&mut state)?;

        let before = state.habits.len();
        state
            .habits
            .retain(|h| !(&h.id == id && &h.owner_id == owner));

        if state.habits.len() == before {
            return Err(StorageError::HabitNotFound {
                habit_id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStorage {
    async fn insert_account(&self, account: &Account) -> Result<(), StorageError> {
        let mut state = self.state();
        if state.accounts.iter().any(|a| a.email == account.email) {
            return Err(StorageError::DuplicateAccount {
                email: account.email.clone(),
            });
        }
        state.accounts.push(account.clone());
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        Ok(self
            .state()
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_account(&self, id: &UserId) -> Result<Option<Account>, StorageError> {
        Ok(self.state().accounts.iter().find(|a| &a.id == id).cloned())
    }

    async fn set_password(&self, id: &UserId, hash: &str) -> Result<(), StorageError> {
        let mut state = self.state();
        let account = state
            .accounts
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| StorageError::AccountNotFound {
                user_id: id.to_string(),
            })?;

        account.password_hash = hash.to_string();
        Ok(())
    }

    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StorageError> {
        self.state()
            .resets
            .insert(token.token.clone(), (token.clone(), false));
        Ok(())
    }

    async fn take_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError> {
        let mut state = self.state();
        match state.resets.get_mut(token) {
            Some((reset, used)) if !*used && !reset.is_expired(now) => {
                *used = true;
                Ok(Some(reset.user_id.clone()))
            }
            _ => Ok(None),
        }
    }
}
