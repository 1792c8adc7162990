/// Local auth gateway backed by the account store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::password::{check_strength, hash_password, verify_password};
use crate::auth::{AuthError, AuthGateway, Session};
use crate::domain::{normalize_email, Account, ResetToken, UserId};
use crate::storage::{AccountStore, StorageError};

/// How long a password reset token stays valid
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Auth gateway that keeps accounts in a local `AccountStore`
///
/// Holds at most one session at a time, matching the single-user,
/// one-session-per-process model of the application.
pub struct LocalAuthGateway<S: AccountStore> {
    store: Arc<S>,
    session: Option<Session>,
    reset_ttl: Duration,
}

impl<S: AccountStore> LocalAuthGateway<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            session: None,
            reset_ttl: Duration::minutes(RESET_TOKEN_TTL_MINUTES),
        }
    }

    /// Override how long reset tokens stay valid
    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    fn start_session(&mut self, user_id: UserId, email: String, recovery: bool) -> Session {
        let session = Session {
            user_id,
            email,
            token: Uuid::new_v4().simple().to_string(),
            issued_at: Utc::now(),
            recovery,
        };
        self.session = Some(session.clone());
        session
    }
}

fn require_fields(fields: &[&str]) -> Result<(), AuthError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AuthError::MissingFields);
    }
    Ok(())
}

#[async_trait]
impl<S: AccountStore> AuthGateway for LocalAuthGateway<S> {
    async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        require_fields(&[email, password])?;
        let email = normalize_email(email)?;

        let account = match self.store.find_account_by_email(&email).await? {
            Some(account) => account,
            None => {
                tracing::debug!("Sign-in for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &account.password_hash) {
            tracing::debug!("Sign-in with wrong password for {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!("User {} signed in", account.id);
        Ok(self.start_session(account.id, account.email, false))
    }

    async fn sign_up(&mut self, email: &str, password: &str) -> Result<Session, AuthError> {
        require_fields(&[email, password])?;
        let email = normalize_email(email)?;
        check_strength(password)?;

        let account = Account {
            id: UserId::new(),
            email,
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        match self.store.insert_account(&account).await {
            Ok(()) => {}
            Err(StorageError::DuplicateAccount { .. }) => return Err(AuthError::AlreadyRegistered),
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Registered user {}", account.id);
        Ok(self.start_session(account.id, account.email, false))
    }

    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AuthError> {
        require_fields(&[email])?;
        let email = normalize_email(email)?;

        let account = match self.store.find_account_by_email(&email).await? {
            Some(account) => account,
            None => {
                tracing::debug!("Password reset requested for unknown email");
                return Ok(None);
            }
        };

        let reset = ResetToken {
            token: Uuid::new_v4().simple().to_string(),
            user_id: account.id,
            expires_at: Utc::now() + self.reset_ttl,
        };
        self.store.insert_reset_token(&reset).await?;

        tracing::info!("Issued password reset for user {}", reset.user_id);
        Ok(Some(reset.token))
    }

    async fn recover(&mut self, token: &str) -> Result<Session, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let user_id = self
            .store
            .take_reset_token(token, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let account = self
            .store
            .find_account(&user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!("User {} started password recovery", account.id);
        Ok(self.start_session(account.id, account.email, true))
    }

    async fn update_password(
        &mut self,
        new_password: &str,
        confirmation: &str,
    ) -> Result<Session, AuthError> {
        let user_id = match &self.session {
            Some(session) => session.user_id.clone(),
            None => return Err(AuthError::NotAuthenticated),
        };

        require_fields(&[new_password, confirmation])?;
        if new_password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        check_strength(new_password)?;

        let hash = hash_password(new_password)?;
        self.store.set_password(&user_id, &hash).await?;

        tracing::info!("Password updated for user {}", user_id);

        match self.session.as_mut() {
            Some(session) => {
                session.recovery = false;
                Ok(session.clone())
            }
            None => Err(AuthError::NotAuthenticated),
        }
    }

    async fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("User {} signed out", session.user_id);
        }
    }

    fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}
