use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::{auth, handlers, items, middleware::auth_middleware, middleware::metrics_middleware};
use crate::state::AppState;

/// Headroom for multipart boundaries and the `item` JSON part.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    // Readable without credentials
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/items", get(items::search_items))
        .route("/items/wishlist", get(items::list_wishlist))
        .route("/items/{id}", get(items::get_item));

    // Writes; the handlers decide whether the caller must be admin
    let protected_routes = Router::new()
        .route("/items", post(items::create_item))
        .route("/items/with-cover", post(items::create_item_with_cover))
        .route("/items/import", post(items::import_items))
        .route(
            "/items/{id}",
            put(items::update_item).delete(items::delete_item),
        )
        .route("/items/{id}/with-cover", put(items::update_item_with_cover))
        .route("/items/{id}/status", patch(items::update_item_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    // Uploaded covers, e.g. /files/<uuid>.png
    let files_path = format!(
        "/{}",
        state.config().storage.public_prefix.trim_matches('/')
    );
    let covers = ServeDir::new(state.storage_root());

    Router::new()
        .nest("/api/v1", api_routes)
        .nest_service(&files_path, covers)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
