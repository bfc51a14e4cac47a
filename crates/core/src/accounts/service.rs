//! Registration, password login and admin bootstrap.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{normalize_username, AccountError, RegisterRequest, UserAccount, UserStore};
use crate::auth::{hash_password, verify_password, Role};
use crate::config::TokenConfig;
use crate::metrics;

pub struct AccountService {
    store: Arc<dyn UserStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Service over `store` with the configured admin account in place.
    pub fn with_admin(
        store: Arc<dyn UserStore>,
        token: &TokenConfig,
    ) -> Result<Self, AccountError> {
        let service = Self::new(store);
        service.ensure_admin(
            &token.admin_username,
            &token.admin_full_name,
            &token.admin_password_hash,
        )?;
        Ok(service)
    }

    /// Create a `User` account from a registration request.
    pub fn register(&self, request: RegisterRequest) -> Result<UserAccount, AccountError> {
        request.validate()?;
        let username = normalize_username(&request.username);

        if self.store.find_by_username(&username)?.is_some() {
            return Err(AccountError::UsernameTaken(username));
        }

        let account = UserAccount {
            id: None,
            username,
            full_name: request.full_name.trim().to_string(),
            password_hash: hash_password(&request.password)?,
            role: Role::User,
            created_at: Utc::now(),
        };
        let saved = self.store.insert(account)?;

        metrics::ACCOUNTS_CREATED
            .with_label_values(&[saved.role.as_str()])
            .inc();
        info!(user = %saved.username, "Account registered");
        Ok(saved)
    }

    /// Check a username and password against the stored account.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub fn login(&self, username: &str, password: &str) -> Result<UserAccount, AccountError> {
        let username = normalize_username(username);
        let account = self
            .store
            .find_by_username(&username)?
            .ok_or(AccountError::InvalidCredentials)?;

        if verify_password(password, &account.password_hash)? {
            debug!(user = %account.username, "Password accepted");
            Ok(account)
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }

    /// Create the admin account from configuration unless it already exists.
    ///
    /// Returns whether an account was created. An existing account keeps
    /// its stored password.
    pub fn ensure_admin(
        &self,
        username: &str,
        full_name: &str,
        password_hash: &str,
    ) -> Result<bool, AccountError> {
        let username = normalize_username(username);
        if self.store.find_by_username(&username)?.is_some() {
            debug!(user = %username, "Admin account already present");
            return Ok(false);
        }

        let account = UserAccount {
            id: None,
            username,
            full_name: full_name.trim().to_string(),
            password_hash: password_hash.trim().to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let saved = self.store.insert(account)?;

        metrics::ACCOUNTS_CREATED
            .with_label_values(&[saved.role.as_str()])
            .inc();
        info!(user = %saved.username, "Admin account created");
        Ok(true)
    }

    pub fn count(&self) -> Result<usize, AccountError> {
        self.store.count()
    }
}
