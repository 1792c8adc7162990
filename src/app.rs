/// Application shell tying sessions to habit collections
///
/// A collection only exists while a user is signed in. Signing in builds a
/// fresh one and loads it; signing out throws it away.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, AuthGateway, Session};
use crate::collection::{HabitCollection, Intent};
use crate::domain::{Clock, Habit, HabitId, Notice, NoticeKind, UserId};
use crate::storage::HabitStore;

/// Errors returned to the presentation layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("You need to sign in first")]
    NotAuthenticated,

    #[error("Set a new password to finish recovering your account")]
    RecoveryPending,
}

/// Store, auth gateway, clock and the active session's habits
pub struct HabitTrackerApp<S: HabitStore, A: AuthGateway, C: Clock> {
    store: Arc<S>,
    auth: A,
    clock: Arc<C>,
    collection: Option<HabitCollection<S, C>>,
}

impl<S: HabitStore, A: AuthGateway, C: Clock> HabitTrackerApp<S, A, C> {
    pub fn new(store: Arc<S>, auth: A, clock: Arc<C>) -> Self {
        Self {
            store,
            auth,
            clock,
            collection: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.auth.current_session()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Vec<Notice>, AppError> {
        let session = self.auth.sign_in(email, password).await?;
        let loaded = self.open_collection(session.user_id).await;
        Ok(vec![Notice::new(NoticeKind::SignedIn, "Welcome back!"), loaded])
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<Vec<Notice>, AppError> {
        let session = self.auth.sign_up(email, password).await?;
        let loaded = self.open_collection(session.user_id).await;
        Ok(vec![
            Notice::new(
                NoticeKind::SignedUp,
                "Account created successfully! Welcome to Zenith Habit Tracker!",
            ),
            loaded,
        ])
    }

    /// Issue a reset token for `email`
    ///
    /// Token delivery is left to the host; the token is written to the log
    /// at info level. The notice is the same whether or not the email is
    /// registered.
    pub async fn request_password_reset(&mut self, email: &str) -> Result<Notice, AppError> {
        if let Some(token) = self.auth.request_password_reset(email).await? {
            tracing::info!(target: "zenith_habits::reset", token = %token, "Password reset token issued");
        }
        Ok(Notice::new(
            NoticeKind::ResetRequested,
            "Password reset email sent! Check your inbox.",
        ))
    }

    /// Start a recovery session from a reset token
    pub async fn recover(&mut self, token: &str) -> Result<Notice, AppError> {
        self.auth.recover(token).await?;
        self.collection = None;
        Ok(Notice::new(
            NoticeKind::SignedIn,
            "Choose a new password to finish signing in.",
        ))
    }

    pub async fn update_password(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Vec<Notice>, AppError> {
        let session = self.auth.update_password(new_password, confirmation).await?;
        let mut notices = vec![Notice::new(
            NoticeKind::PasswordUpdated,
            "Password updated successfully!",
        )];

        if self.collection.is_none() {
            notices.push(self.open_collection(session.user_id).await);
        }
        Ok(notices)
    }

    pub async fn sign_out(&mut self) -> Notice {
        self.auth.sign_out().await;
        self.collection = None;
        Notice::new(NoticeKind::SignedOut, "You have been signed out.")
    }

    pub fn collection(&self) -> Result<&HabitCollection<S, C>, AppError> {
        match &self.collection {
            Some(collection) => Ok(collection),
            None => Err(self.missing_collection()),
        }
    }

    pub fn habits(&self) -> Result<&[Habit], AppError> {
        Ok(self.collection()?.habits())
    }

    /// Route a habit intent to the active collection
    pub async fn dispatch(&mut self, intent: Intent) -> Result<Option<Notice>, AppError> {
        let missing = self.missing_collection();
        match self.collection.as_mut() {
            Some(collection) => Ok(collection.dispatch(intent).await),
            None => Err(missing),
        }
    }

    pub async fn add(&mut self, name: &str) -> Result<Option<Notice>, AppError> {
        self.dispatch(Intent::Add(name.to_string())).await
    }

    pub async fn complete(&mut self, id: &HabitId) -> Result<Option<Notice>, AppError> {
        self.dispatch(Intent::Complete(id.clone())).await
    }

    pub async fn delete(&mut self, id: &HabitId) -> Result<Option<Notice>, AppError> {
        self.dispatch(Intent::Delete(id.clone())).await
    }

    pub async fn reload(&mut self) -> Result<Option<Notice>, AppError> {
        self.dispatch(Intent::Reload).await
    }

    async fn open_collection(&mut self, owner: UserId) -> Notice {
        let mut collection = HabitCollection::new(owner, self.store.clone(), self.clock.clone());
        let notice = collection
            .dispatch(Intent::Reload)
            .await
            .unwrap_or_else(|| Notice::loaded(0));
        self.collection = Some(collection);
        notice
    }

    fn missing_collection(&self) -> AppError {
        match self.auth.current_session() {
            Some(session) if session.recovery => AppError::RecoveryPending,
            _ => AppError::NotAuthenticated,
        }
    }
}
