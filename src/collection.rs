/// Habit collection controller
///
/// Owns the in-session list of the signed-in user's habits and mediates
/// every change with the record store. Local state only changes after the
/// store has confirmed a write, so a failed operation never leaves the list
/// half-updated.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{
    Clock, DomainError, Habit, HabitChanges, HabitId, NewHabit, Notice, UserId,
};
use crate::storage::{HabitStore, StorageError};

/// Errors surfaced by controller operations
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("{0}")]
    Validation(#[from] DomainError),

    #[error("Could not save your changes: {0}")]
    Persist(#[source] StorageError),

    #[error("Could not load your habits: {0}")]
    Load(#[source] StorageError),
}

impl CollectionError {
    /// The error notice shown for this failure
    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

/// A user request routed through the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Reload,
    Add(String),
    Complete(HabitId),
    Delete(HabitId),
}

/// The session's habits and the operations that change them
pub struct HabitCollection<S: HabitStore, C: Clock> {
    owner: UserId,
    store: Arc<S>,
    clock: Arc<C>,
    habits: Vec<Habit>,
    draft: String,
}

impl<S: HabitStore, C: Clock> HabitCollection<S, C> {
    /// An empty collection for `owner`; call [`load`](Self::load) to fill it
    pub fn new(owner: UserId, store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            owner,
            store,
            clock,
            habits: Vec::new(),
            draft: String::new(),
        }
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Habits in display order, newest first
    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Whether the habit was already completed today, for disabling the
    /// completion control
    pub fn is_completed_today(&self, id: &HabitId) -> bool {
        let today = self.clock.today();
        self.get(id).map_or(false, |h| h.is_completed_on(today))
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Add a habit named after the current draft
    pub async fn submit_draft(&mut self) -> Result<Notice, CollectionError> {
        let name = self.draft.clone();
        self.add(&name).await
    }

    /// Replace local state with the owner's habits from the store
    ///
    /// On failure the previous list is kept as it was.
    pub async fn load(&mut self) -> Result<Notice, CollectionError> {
        let habits = self
            .store
            .list(&self.owner)
            .await
            .map_err(CollectionError::Load)?;

        tracing::debug!("Loaded {} habits for {}", habits.len(), self.owner);
        self.habits = habits;
        Ok(Notice::loaded(self.habits.len()))
    }

    /// Create a habit and put it at the top of the list
    pub async fn add(&mut self, name: &str) -> Result<Notice, CollectionError> {
        let new_habit = NewHabit::new(self.owner.clone(), name)?;

        let habit = self
            .store
            .create(new_habit)
            .await
            .map_err(CollectionError::Persist)?;

        tracing::info!("Added habit {} ({})", habit.name, habit.id);
        self.habits.insert(0, habit);
        self.draft.clear();
        Ok(Notice::added())
    }

    /// Mark a habit as done for today
    ///
    /// Returns `Ok(None)` when the habit is not in the collection. A second
    /// completion on the same day produces an info notice and no store write.
    pub async fn complete(&mut self, id: &HabitId) -> Result<Option<Notice>, CollectionError> {
        let index = match self.position(id) {
            Some(index) => index,
            None => return Ok(None),
        };

        let today = self.clock.today();
        let outcome = self.habits[index].decide_completion(today);

        let change = match outcome.change() {
            Some(change) => change,
            None => {
                tracing::debug!("Habit {} already completed on {}", id, today);
                return Ok(Some(outcome.notice()));
            }
        };

        let updated = self
            .store
            .update(
                &self.owner,
                id,
                HabitChanges::completion(change.new_streak, change.new_date),
            )
            .await
            .map_err(CollectionError::Persist)?;

        tracing::info!(
            "Completed habit {} on {}: {:?}, streak {}",
            id,
            today,
            outcome.kind(),
            updated.streak
        );

        self.habits[index] = updated;
        Ok(Some(outcome.notice()))
    }

    /// Remove a habit
    ///
    /// Returns `Ok(None)` without touching the store when the habit is not
    /// in the collection.
    pub async fn delete(&mut self, id: &HabitId) -> Result<Option<Notice>, CollectionError> {
        if self.position(id).is_none() {
            return Ok(None);
        }

        self.store
            .delete(&self.owner, id)
            .await
            .map_err(CollectionError::Persist)?;

        tracing::info!("Deleted habit {}", id);
        self.habits.retain(|h| &h.id != id);
        Ok(Some(Notice::removed()))
    }

    /// Run an intent and turn any failure into an error notice
    ///
    /// Nothing propagates past this point; `None` means the intent was a
    /// no-op on an unknown habit.
    pub async fn dispatch(&mut self, intent: Intent) -> Option<Notice> {
        let result = match intent {
            Intent::Reload => self.load().await.map(Some),
            Intent::Add(name) => self.add(&name).await.map(Some),
            Intent::Complete(id) => self.complete(&id).await,
            Intent::Delete(id) => self.delete(&id).await,
        };

        match result {
            Ok(notice) => notice,
            Err(e) => {
                tracing::warn!("Habit operation failed: {}", e);
                Some(e.notice())
            }
        }
    }

    fn position(&self, id: &HabitId) -> Option<usize> {
        self.habits.iter().position(|h| &h.id == id)
    }
}
