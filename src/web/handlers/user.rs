//! User handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::web::dto::{CreateUserRequest, JsonBody, UserResponse};
use crate::web::error::ApiResult;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// POST /users - Register a new user.
pub async fn post_new(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .catalog
        .create_user(req.email.as_deref(), req.password.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/me - Current user.
pub async fn get_me(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(user.into())
}
