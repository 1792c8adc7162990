/// Local user accounts and password reset tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, UserId};

/// A registered user as the account store keeps it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    /// Lower-cased, trimmed e-mail address; unique per store
    pub email: String,
    /// Argon2 PHC string; embeds its own salt and parameters
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A single-use token that lets a user set a new password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Normalize an e-mail address for lookup and storage
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(DomainError::Validation {
            message: "Please fill in your email".to_string(),
        });
    }

    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(trimmed.to_lowercase())
        }
        _ => Err(DomainError::Validation {
            message: format!("'{}' is not a valid email address", trimmed),
        }),
    }
}
