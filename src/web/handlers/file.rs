//! File handlers.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{DataQuery, EntryResponse, JsonBody, ListQuery, UploadRequest};
use crate::web::error::{ApiError, ApiResult};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Entry IDs that do not parse cannot exist.
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim().parse().map_err(|_| ApiError::not_found())
}

/// POST /files - Upload a file, image, or folder.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    JsonBody(req): JsonBody<UploadRequest>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let new_entry = req.into_new_entry()?;
    let entry = state.catalog.create_entry(user.id, new_entry).await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::created(entry))))
}

/// GET /files - List entries under a parent, 20 per page.
pub async fn index(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let Some(parent_id) = query.parent_id() else {
        return Ok(Json(Vec::new()));
    };

    let entries = state
        .catalog
        .list_entries(user.id, parent_id, query.page())
        .await?;

    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// GET /files/:id - Entry metadata.
pub async fn show(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.catalog.get_entry(user.id, parse_id(&id)?).await?;
    Ok(Json(entry.into()))
}

/// PUT /files/:id/publish - Make an entry public.
pub async fn publish(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state
        .catalog
        .set_visibility(user.id, parse_id(&id)?, true)
        .await?;
    Ok(Json(entry.into()))
}

/// PUT /files/:id/unpublish - Make an entry private.
pub async fn unpublish(
    State(state): State<Arc<AppState>>,
    AuthUser { user, .. }: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state
        .catalog
        .set_visibility(user.id, parse_id(&id)?, false)
        .await?;
    Ok(Json(entry.into()))
}

/// GET /files/:id/data - Entry content, or a derivative with `?size=`.
pub async fn data(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user): OptionalAuthUser,
    Path(id): Path<String>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Response> {
    let file_id = parse_id(&id)?;
    let size = query.size().ok_or_else(ApiError::not_found)?;

    let (entry, content) = state
        .catalog
        .read_content(user.map(|u| u.id), file_id, size)
        .await?;

    let mime = mime_guess::from_path(&entry.name).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal()
        })
}
