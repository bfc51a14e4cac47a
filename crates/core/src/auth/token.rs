//! Signed bearer tokens for password login.
//!
//! Tokens are HS256 JWTs carrying the username, role, issued-at and expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::api_key::bearer_token;
use super::{AuthError, AuthRequest, Authenticator, Identity, Role};
use crate::config::TokenConfig;

/// Longest accepted token lifetime: ten years.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Username the token was issued to.
    pub sub: String,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies login tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret.as_bytes(), config.ttl_secs)
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| AuthError::ServiceUnavailable(format!("token signing failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            username: claims.sub,
            role,
            expires_at,
        })
    }

    /// Check the signature, then the expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AuthError::InvalidCredentials("Token expired".to_string())
                }
                ErrorKind::InvalidSignature => {
                    AuthError::InvalidCredentials("Invalid token signature".to_string())
                }
                _ => AuthError::InvalidCredentials(format!("Malformed token: {}", e)),
            })
    }
}

/// Authenticator that accepts bearer tokens from a [`TokenIssuer`].
pub struct TokenAuthenticator {
    issuer: Arc<TokenIssuer>,
}

impl TokenAuthenticator {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let token = bearer_token(request).ok_or(AuthError::NotAuthenticated)?;
        let claims = self.issuer.verify(token)?;

        let mut extra = HashMap::new();
        extra.insert("iat".to_string(), serde_json::json!(claims.iat));
        extra.insert("exp".to_string(), serde_json::json!(claims.exp));
        if let Some(expires_at) = Utc.timestamp_opt(claims.exp, 0).single() {
            extra.insert(
                "expires_at".to_string(),
                serde_json::json!(expires_at.to_rfc3339()),
            );
        }

        Ok(Identity {
            user_id: claims.sub,
            method: "token".to_string(),
            role: claims.role,
            claims: extra,
        })
    }

    fn method_name(&self) -> &'static str {
        "token"
    }
}
