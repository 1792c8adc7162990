/// Authentication gateway
///
/// The habit controller only runs for an authenticated user. This module
/// defines the gateway contract (sign-in, sign-up, password reset, password
/// update, sign-out, current session) and a local implementation backed by
/// an `AccountStore`.

pub mod local;
pub mod password;

pub use local::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DomainError, UserId};
use crate::storage::StorageError;

/// Errors returned by an auth gateway
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("{0}")]
    InvalidEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    AlreadyRegistered,

    #[error("Password must be at least {min_len} characters long")]
    WeakPassword { min_len: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("You need to sign in first")]
    NotAuthenticated,

    #[error("This password reset link is invalid or has expired")]
    InvalidToken,

    #[error("Could not secure the password: {0}")]
    Hashing(String),

    #[error("Authentication storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<DomainError> for AuthError {
    fn from(e: DomainError) -> Self {
        AuthError::InvalidEmail(e.to_string())
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    /// Created from a password reset token; only good for setting a password
    pub recovery: bool,
}

/// Contract for signing users in and out
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Sign in with an email and password
    async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Register a new account and sign it in
    async fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Start a password reset
    ///
    /// Returns the reset token when the email belongs to an account. Unknown
    /// emails succeed with `None` so callers cannot probe for accounts.
    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError>;

    /// Exchange a reset token for a recovery session
    async fn recover(&mut self, token: &str) -> Result<Session, AuthError>;

    /// Set a new password for the current session's user
    ///
    /// A recovery session becomes a normal session on success.
    async fn update_password(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Session, AuthError>;

    /// End the current session, if any
    async fn sign_out(&mut self);

    fn current_session(&self) -> Option<&Session>;
}
