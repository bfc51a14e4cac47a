//! Login and registration endpoints for token authentication.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use comicshelf_core::{
    AccountError, AccountService, IssuedToken, RegisterRequest, Role, TokenIssuer, UserAccount,
};

use super::handlers::{ApiError, ErrorResponse};
use crate::metrics::AUTH_FAILURES_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// Token plus the account it was issued to.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub expires_at: String,
}

impl LoginResponse {
    fn new(issued: IssuedToken, account: UserAccount) -> Self {
        Self {
            token: issued.token,
            username: issued.username,
            full_name: account.full_name,
            role: issued.role,
            expires_at: issued.expires_at.to_rfc3339(),
        }
    }
}

/// Map an account error to its HTTP status and body.
pub fn account_error(err: AccountError) -> ApiError {
    let status = match &err {
        AccountError::Validation(_) => StatusCode::BAD_REQUEST,
        AccountError::UsernameTaken(_) => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::Database(_) | AccountError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

fn login_services(state: &AppState) -> Result<(&TokenIssuer, &AccountService), ApiError> {
    state.login_services().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Login is not enabled")),
        )
    })
}

fn issue_for(issuer: &TokenIssuer, account: UserAccount) -> Result<LoginResponse, ApiError> {
    let issued = issuer.issue(&account.username, account.role).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;
    Ok(LoginResponse::new(issued, account))
}

/// Exchange a username and password for a signed token.
///
/// Only available with the token auth method; 404 otherwise.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (issuer, accounts) = login_services(&state)?;

    let account = accounts
        .login(&body.username, &body.password)
        .map_err(|e| {
            if matches!(e, AccountError::InvalidCredentials) {
                warn!(user = %body.username, "Rejected login");
                AUTH_FAILURES_TOTAL
                    .with_label_values(&["invalid_credentials"])
                    .inc();
            }
            account_error(e)
        })?;

    let response = issue_for(issuer, account)?;
    info!(user = %response.username, role = response.role.as_str(), "Issued login token");
    Ok(Json(response))
}

/// Create a `user` account and log it in.
///
/// Only available with the token auth method; 404 otherwise.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let (issuer, accounts) = login_services(&state)?;

    let account = accounts.register(body).map_err(account_error)?;
    let response = issue_for(issuer, account)?;
    Ok((StatusCode::CREATED, Json(response)))
}
