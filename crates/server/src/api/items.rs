//! Catalog item API handlers.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use comicshelf_core::{
    CatalogError, CatalogItem, CoverUpload, ItemRequest, ItemStatus, SearchFilter,
};

use super::handlers::{bad_request, catalog_error, ApiError, ErrorResponse};
use super::middleware::{AdminUser, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating or updating an item.
///
/// Every field defaults so that missing required values surface as
/// validation errors rather than deserialization failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemBody {
    pub title: String,
    pub series: Option<String>,
    #[serde(alias = "issueNumber")]
    pub issue_number: String,
    pub publisher: String,
    pub language: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    /// Status literal; blank or absent means OWNED.
    pub status: Option<String>,
    pub tags: Vec<String>,
}

impl ItemBody {
    pub fn into_request(self) -> Result<ItemRequest, CatalogError> {
        let status = ItemStatus::parse_or_default(self.status.as_deref())?;
        Ok(ItemRequest {
            title: self.title,
            series: self.series,
            issue_number: self.issue_number,
            publisher: self.publisher,
            language: self.language,
            condition: self.condition,
            location: self.location,
            description: self.description,
            image_url: self.image_url,
            status,
            tags: self.tags,
        })
    }
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Response for item operations
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub title: String,
    pub series: Option<String>,
    pub issue_number: String,
    pub publisher: String,
    pub language: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub status: ItemStatus,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CatalogItem> for ItemResponse {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id.unwrap_or_default(),
            title: item.title,
            series: item.series,
            issue_number: item.issue_number,
            publisher: item.publisher,
            language: item.language,
            condition: item.condition,
            location: item.location,
            description: item.description,
            image_url: item.image_url,
            status: item.status,
            tags: item.tags.as_slice().to_vec(),
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

fn respond_all(items: Vec<CatalogItem>) -> Json<Vec<ItemResponse>> {
    Json(items.into_iter().map(ItemResponse::from).collect())
}

/// Build a search filter from query pairs.
///
/// `tags` may repeat and each value may hold a comma-separated list.
pub fn filter_from_query(params: &[(String, String)]) -> Result<SearchFilter, CatalogError> {
    let mut filter = SearchFilter::new();
    let mut tags = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "term" => filter = filter.with_term(value.as_str()),
            "publisher" => filter = filter.with_publisher(value.as_str()),
            "series" => filter = filter.with_series(value.as_str()),
            "status" => {
                if let Some(status) = ItemStatus::parse_optional(Some(value.as_str()))? {
                    filter = filter.with_status(status);
                }
            }
            "tags" => tags.extend(value.split(',').map(str::to_string)),
            _ => {}
        }
    }
    if !tags.is_empty() {
        filter = filter.with_tags(tags);
    }
    Ok(filter)
}

// ============================================================================
// Multipart
// ============================================================================

fn multipart_error(err: MultipartError) -> ApiError {
    (err.status(), Json(ErrorResponse::new(err.body_text())))
}

/// Read an `item` JSON part and an optional `cover` file part.
async fn read_item_form(
    mut multipart: Multipart,
) -> Result<(ItemRequest, Option<CoverUpload>), ApiError> {
    let mut body: Option<ItemBody> = None;
    let mut cover: Option<CoverUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "item" => {
                let text = field.text().await.map_err(multipart_error)?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| bad_request(format!("Invalid item JSON: {}", e)))?;
                body = Some(parsed);
            }
            "cover" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                cover = Some(CoverUpload::new(file_name, bytes.to_vec()));
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let body = body.ok_or_else(|| bad_request("Missing 'item' part"))?;
    let request = body.into_request().map_err(catalog_error)?;
    Ok((request, cover))
}

// ============================================================================
// Handlers
// ============================================================================

/// Search items; no parameters lists everything.
pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let filter = filter_from_query(&params).map_err(catalog_error)?;
    state
        .catalog()
        .search(&filter)
        .map(respond_all)
        .map_err(catalog_error)
}

pub async fn list_wishlist(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    state
        .catalog()
        .wishlist()
        .map(respond_all)
        .map_err(catalog_error)
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, ApiError> {
    state
        .catalog()
        .get(id)
        .map(|item| Json(ItemResponse::from(item)))
        .map_err(catalog_error)
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(body): Json<ItemBody>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let request = body.into_request().map_err(catalog_error)?;
    let item = state
        .catalog()
        .create(request, None)
        .map_err(catalog_error)?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

pub async fn create_item_with_cover(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let (request, cover) = read_item_form(multipart).await?;
    let item = state
        .catalog()
        .create(request, cover.as_ref())
        .map_err(catalog_error)?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<ItemBody>,
) -> Result<Json<ItemResponse>, ApiError> {
    let request = body.into_request().map_err(catalog_error)?;
    state
        .catalog()
        .update(id, request, None)
        .map(|item| Json(ItemResponse::from(item)))
        .map_err(catalog_error)
}

pub async fn update_item_with_cover(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ItemResponse>, ApiError> {
    let (request, cover) = read_item_form(multipart).await?;
    state
        .catalog()
        .update(id, request, cover.as_ref())
        .map(|item| Json(ItemResponse::from(item)))
        .map_err(catalog_error)
}

/// Change only the status; open to any authenticated caller.
pub async fn update_item_status(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ItemResponse>, ApiError> {
    let status: ItemStatus = body.status.parse().map_err(catalog_error)?;
    debug!(id, status = %status, user = %identity.user_id, "Updating item status");
    state
        .catalog()
        .update_status(id, status)
        .map(|item| Json(ItemResponse::from(item)))
        .map_err(catalog_error)
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete(id).map_err(catalog_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Import items from a CSV `file` part.
///
/// On a bad row the rows before it stay imported and the error names the
/// line and the count.
pub async fn import_items(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ItemResponse>>), ApiError> {
    let mut csv = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            csv = Some(field.bytes().await.map_err(multipart_error)?);
        }
    }
    let csv = csv.ok_or_else(|| bad_request("Missing 'file' part"))?;

    let items = state
        .catalog()
        .import_csv(csv.as_ref())
        .map_err(catalog_error)?;
    Ok((StatusCode::CREATED, respond_all(items)))
}
