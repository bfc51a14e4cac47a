//! Argon2id password hashes in PHC string form.

use argon2::password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::Argon2;

use super::AuthError;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::ServiceUnavailable(format!("password hashing failed: {}", e)))
}

/// Check a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; a hash that does not parse is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::ConfigurationError(format!("malformed password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(AuthError::ServiceUnavailable(format!(
            "password verification failed: {}",
            e
        ))),
    }
}

/// Whether `value` parses as a PHC password hash.
pub fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}
