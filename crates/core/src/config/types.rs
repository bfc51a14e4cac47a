use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::catalog::DEFAULT_MAX_TAGS;
use crate::storage::DEFAULT_MAX_UPLOAD_BYTES;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Shared key for the `api_key` method.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Signed token settings for the `token` method.
    #[serde(default)]
    pub token: Option<TokenConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
    Token,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
            AuthMethod::Token => "token",
        }
    }
}

/// Signed login token configuration
///
/// The admin account is created in the user store at start-up when no
/// account with `admin_username` exists yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// HS256 signing secret (at least 32 bytes).
    pub secret: String,
    /// Token lifetime in seconds (default: 24h)
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_full_name")]
    pub admin_full_name: String,
    /// Argon2 PHC string of the admin password.
    pub admin_password_hash: String,
}

fn default_token_ttl() -> u64 {
    86_400
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_full_name() -> String {
    "Administrator".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("comicshelf.db")
}

/// Cover storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding uploaded covers.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// URL prefix covers are served under.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_prefix: default_public_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_prefix() -> String {
    "/files/".to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

/// Catalog behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Tags kept per item; extra tags are dropped.
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    /// Insert a few sample items at start-up when the catalog is empty.
    #[serde(default)]
    pub seed_sample_items: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_tags: default_max_tags(),
            seed_sample_items: false,
        }
    }
}

fn default_max_tags() -> usize {
    DEFAULT_MAX_TAGS
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<SanitizedTokenConfig>,
}

/// Sanitized token config (secret and password digest hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTokenConfig {
    pub ttl_secs: u64,
    pub admin_username: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
                token: config.auth.token.as_ref().map(|t| SanitizedTokenConfig {
                    ttl_secs: t.ttl_secs,
                    admin_username: t.admin_username.clone(),
                }),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            catalog: config.catalog.clone(),
        }
    }
}
