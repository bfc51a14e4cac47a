//! SQLite-backed user store.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, ErrorCode, OptionalExtension};

use super::{AccountError, UserAccount, UserStore};
use crate::auth::Role;

/// User store sharing the catalog's database file.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    /// Open the database at `path`, creating the `users` table if needed.
    pub fn new(path: &Path) -> Result<Self, AccountError> {
        let conn = Connection::open(path).map_err(db_error)?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory user store (useful for testing).
    pub fn in_memory() -> Result<Self, AccountError> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), AccountError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(db_error)
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<UserAccount> {
        let role_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;

        let role = match role_str.as_str() {
            "admin" => Role::Admin,
            "user" => Role::User,
            other => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    4,
                    Type::Text,
                    format!("unknown role '{}'", other).into(),
                ))
            }
        };
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(UserAccount {
            id: Some(row.get(0)?),
            username: row.get(1)?,
            full_name: row.get(2)?,
            password_hash: row.get(3)?,
            role,
            created_at,
        })
    }
}

impl UserStore for SqliteUserStore {
    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, AccountError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT id, username, full_name, password_hash, role, created_at
             FROM users WHERE username = ?",
            params![username],
            Self::row_to_account,
        )
        .optional()
        .map_err(db_error)
    }

    fn insert(&self, mut account: UserAccount) -> Result<UserAccount, AccountError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.execute(
            "INSERT INTO users (username, full_name, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                &account.username,
                &account.full_name,
                &account.password_hash,
                account.role.as_str(),
                account.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                account.id = Some(conn.last_insert_rowid());
                Ok(account)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(AccountError::UsernameTaken(account.username))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    fn count(&self) -> Result<usize, AccountError> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(db_error)?;
        Ok(count as usize)
    }
}

fn db_error(e: rusqlite::Error) -> AccountError {
    AccountError::Database(e.to_string())
}
