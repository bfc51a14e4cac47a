use super::{types::Config, AuthMethod, ConfigError};
use crate::auth::is_password_hash;

/// Shortest accepted token signing secret, in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde)
/// - Auth method has the settings it needs
/// - Server port is not 0
/// - Storage and catalog limits are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    match config.auth.method {
        AuthMethod::None => {}
        AuthMethod::ApiKey => {
            if config.auth.api_key.as_deref().unwrap_or_default().is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.api_key must be set when auth.method is api_key".to_string(),
                ));
            }
        }
        AuthMethod::Token => {
            let token = config.auth.token.as_ref().ok_or_else(|| {
                ConfigError::ValidationError(
                    "[auth.token] must be set when auth.method is token".to_string(),
                )
            })?;
            if token.secret.len() < MIN_TOKEN_SECRET_LEN {
                return Err(ConfigError::ValidationError(format!(
                    "auth.token.secret must be at least {} bytes",
                    MIN_TOKEN_SECRET_LEN
                )));
            }
            if token.admin_username.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.token.admin_username cannot be empty".to_string(),
                ));
            }
            if !is_password_hash(token.admin_password_hash.trim()) {
                return Err(ConfigError::ValidationError(
                    "auth.token.admin_password_hash must be an argon2 PHC string".to_string(),
                ));
            }
            if token.ttl_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "auth.token.ttl_secs cannot be 0".to_string(),
                ));
            }
        }
    }

    if config.storage.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "storage.max_upload_bytes cannot be 0".to_string(),
        ));
    }

    if config.storage.public_prefix.trim_matches('/').is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.public_prefix must name a path below the root, e.g. /files/".to_string(),
        ));
    }

    if config.catalog.max_tags == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.max_tags cannot be 0".to_string(),
        ));
    }

    Ok(())
}
