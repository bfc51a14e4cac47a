mod api_key;
mod none;
mod password;
mod token;
mod traits;
mod types;

pub use api_key::ApiKeyAuthenticator;
pub use none::*;
pub use password::*;
pub use token::*;
pub use traits::*;
pub use types::*;

use std::sync::Arc;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::ApiKey => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "api_key must be set when using ApiKey auth method".to_string(),
                    )
                })?;
            Ok(Box::new(ApiKeyAuthenticator::new(api_key)))
        }
        AuthMethod::Token => {
            let issuer = create_token_issuer(config)?.ok_or_else(missing_token_section)?;
            Ok(Box::new(TokenAuthenticator::new(issuer)))
        }
    }
}

/// Token issuer for the login endpoint; `None` unless the method is token.
pub fn create_token_issuer(config: &AuthConfig) -> Result<Option<Arc<TokenIssuer>>, AuthError> {
    if config.method != AuthMethod::Token {
        return Ok(None);
    }
    let token = config.token.as_ref().ok_or_else(missing_token_section)?;
    Ok(Some(Arc::new(TokenIssuer::from_config(token))))
}

fn missing_token_section() -> AuthError {
    AuthError::ConfigurationError(
        "[auth.token] must be set when using Token auth method".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;

    fn auth_config(method: AuthMethod) -> AuthConfig {
        AuthConfig {
            method,
            api_key: None,
            token: None,
        }
    }

    #[test]
    fn test_create_authenticator_none() {
        let auth = create_authenticator(&auth_config(AuthMethod::None)).unwrap();
        assert_eq!(auth.method_name(), "none");
    }

    #[test]
    fn test_create_authenticator_api_key() {
        let config = AuthConfig {
            api_key: Some("secret-key".to_string()),
            ..auth_config(AuthMethod::ApiKey)
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "api_key");
    }

    #[test]
    fn test_create_authenticator_api_key_missing_key() {
        let result = create_authenticator(&auth_config(AuthMethod::ApiKey));
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }

    #[test]
    fn test_create_authenticator_token() {
        let config = AuthConfig {
            token: Some(TokenConfig {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
                ttl_secs: 60,
                admin_username: "admin".to_string(),
                admin_full_name: "Administrator".to_string(),
                admin_password_hash: hash_password("pw").unwrap(),
            }),
            ..auth_config(AuthMethod::Token)
        };
        let auth = create_authenticator(&config).unwrap();
        assert_eq!(auth.method_name(), "token");
        assert!(create_token_issuer(&config).unwrap().is_some());
    }

    #[test]
    fn test_create_authenticator_token_missing_section() {
        let result = create_authenticator(&auth_config(AuthMethod::Token));
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }

    #[test]
    fn test_no_token_issuer_for_other_methods() {
        assert!(create_token_issuer(&auth_config(AuthMethod::None))
            .unwrap()
            .is_none());
    }
}
