use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, Role};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 120;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 120;
pub const FULL_NAME_MAX_LEN: usize = 150;

/// A stored login account.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: Option<i64>,
    /// Lower-cased, unique.
    pub username: String,
    pub full_name: String,
    /// Argon2 PHC string; never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Self-service registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(alias = "fullName")]
    pub full_name: String,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
        }
    }

    /// Check field lengths, collecting every problem.
    ///
    /// Lengths count characters after trimming; the password is not trimmed.
    pub fn validate(&self) -> Result<(), AccountError> {
        let mut problems = Vec::new();

        let username = self.username.trim().chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username) {
            problems.push(format!(
                "username must be {}-{} characters",
                USERNAME_MIN_LEN, USERNAME_MAX_LEN
            ));
        }

        let password = self.password.chars().count();
        if self.password.trim().is_empty()
            || !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password)
        {
            problems.push(format!(
                "password must be {}-{} characters",
                PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
            ));
        }

        let full_name = self.full_name.trim().chars().count();
        if full_name == 0 {
            problems.push("full_name is required".to_string());
        } else if full_name > FULL_NAME_MAX_LEN {
            problems.push(format!(
                "full_name must be at most {} characters",
                FULL_NAME_MAX_LEN
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AccountError::Validation(problems.join("; ")))
        }
    }
}

/// Errors for account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Username already registered: {0}")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Stored form of a username.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
