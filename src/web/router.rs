//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    connect, data, disconnect, get_me, index, post_new, publish, show, stats, status, unpublish,
    upload, AppState,
};
use super::middleware::create_cors_layer;

/// Request body limit for a given decoded upload limit.
///
/// Uploads arrive base64-encoded inside JSON, which inflates them by 4/3.
pub fn body_limit_for(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(4)
        .saturating_div(3)
        .saturating_add(64 * 1024)
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_upload_bytes: usize,
) -> Router {
    let app_routes = Router::new()
        .route("/status", get(status))
        .route("/stats", get(stats));

    let user_routes = Router::new()
        .route("/users", post(post_new))
        .route("/users/me", get(get_me))
        .route("/connect", get(connect))
        .route("/disconnect", get(disconnect));

    let file_routes = Router::new()
        .route("/files", post(upload).get(index))
        .route("/files/:id", get(show))
        .route("/files/:id/publish", put(publish))
        .route("/files/:id/unpublish", put(unpublish))
        .route("/files/:id/data", get(data));

    Router::new()
        .merge(app_routes)
        .merge(user_routes)
        .merge(file_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit_for(max_upload_bytes))),
        )
        .with_state(app_state)
}
