//! User accounts for password login.
//!
//! Accounts live next to the catalog in the same SQLite database. Usernames
//! are stored lower-cased and are unique.

mod service;
mod sqlite;
mod types;

pub use service::AccountService;
pub use sqlite::SqliteUserStore;
pub use types::*;

use std::path::Path;
use std::sync::Arc;

use crate::auth::AuthError;
use crate::config::{AuthConfig, AuthMethod};

/// Trait for account persistence backends.
pub trait UserStore: Send + Sync {
    /// Look up an account by its stored (lower-cased) username.
    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AccountError>;

    /// Insert a new account and return it with its id.
    ///
    /// Fails with [`AccountError::UsernameTaken`] if the username exists.
    fn insert(&self, account: UserAccount) -> Result<UserAccount, AccountError>;

    /// Number of stored accounts.
    fn count(&self) -> Result<usize, AccountError>;
}

/// Account service for login and registration; `None` unless the method is
/// token.
///
/// Opens the `users` table in the database at `db_path` and creates the
/// configured admin account if it is missing.
pub fn create_account_service(
    auth: &AuthConfig,
    db_path: &Path,
) -> Result<Option<Arc<AccountService>>, AccountError> {
    if auth.method != AuthMethod::Token {
        return Ok(None);
    }
    let token = auth.token.as_ref().ok_or_else(|| {
        AccountError::Auth(AuthError::ConfigurationError(
            "[auth.token] must be set when using Token auth method".to_string(),
        ))
    })?;

    let store = Arc::new(SqliteUserStore::new(db_path)?);
    let service = AccountService::with_admin(store, token)?;
    Ok(Some(Arc::new(service)))
}
