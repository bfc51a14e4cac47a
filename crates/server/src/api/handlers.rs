use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use comicshelf_core::{CatalogError, SanitizedConfig};

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body shared by every API handler.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// CSV line of the failing row (import errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// Rows committed before the failing row (import errors only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<usize>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            line: None,
            imported: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a catalog error to its HTTP status and body.
pub fn catalog_error(err: CatalogError) -> ApiError {
    let status = match &err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Validation(_) | CatalogError::Import { .. } => StatusCode::BAD_REQUEST,
        CatalogError::Database(_) | CatalogError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let mut body = ErrorResponse::new(err.to_string());
    if let CatalogError::Import { line, imported, .. } = err {
        body.line = Some(line);
        body.imported = Some(imported);
    }
    (status, Json(body))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
