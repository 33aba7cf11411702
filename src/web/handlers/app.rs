//! Service status handlers.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::file::CatalogStats;
use crate::web::dto::StatusResponse;
use crate::web::error::ApiResult;
use crate::web::handlers::AppState;

/// GET /status - Whether the database and the session cache answer.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let db = state.catalog.db().is_alive().await;
    let cache = state.sessions.is_alive().await;
    if !db || !cache {
        tracing::warn!(db, cache, "Backing store unavailable");
    }

    Json(StatusResponse { db, cache })
}

/// GET /stats - Number of users and entries.
pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<CatalogStats>> {
    Ok(Json(state.catalog.stats().await?))
}
