//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use std::sync::Arc;

use crate::web::dto::TokenResponse;
use crate::web::error::{ApiError, ApiResult};
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /connect - Exchange basic credentials for a session token.
pub async fn connect(
    State(state): State<Arc<AppState>>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
) -> ApiResult<Json<TokenResponse>> {
    let TypedHeader(Authorization(basic)) = credentials.ok_or_else(ApiError::unauthorized)?;

    let user = state
        .catalog
        .authenticate(basic.username(), basic.password())
        .await?;
    let token = state.sessions.create(user.id).await?;

    tracing::info!(user_id = user.id, "User connected");
    Ok(Json(TokenResponse { token }))
}

/// GET /disconnect - Revoke the current session token.
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    AuthUser { user, token }: AuthUser,
) -> ApiResult<StatusCode> {
    state.sessions.revoke(&token).await?;

    tracing::info!(user_id = user.id, "User disconnected");
    Ok(StatusCode::NO_CONTENT)
}
