//! Session token extractors.
//!
//! Clients send the token returned by `/connect` in the `X-Token` header.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::db::User;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "x-token";

fn token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolve a token to an existing user.
///
/// Cache and database failures surface as errors; an unknown token, or one
/// whose user no longer exists, yields `None`.
async fn resolve_user(state: &AppState, token: &str) -> Result<Option<User>, ApiError> {
    let Some(user_id) = state.sessions.resolve(token).await? else {
        return Ok(None);
    };
    Ok(state.catalog.get_user(user_id).await?)
}

/// Extractor for authenticated users.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// The token the request was authenticated with.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or_else(ApiError::unauthorized)?;

        match resolve_user(state, &token).await? {
            Some(user) => Ok(AuthUser { user, token }),
            None => {
                tracing::debug!("Rejected unknown or expired session token");
                Err(ApiError::unauthorized())
            }
        }
    }
}

/// Optional authentication extractor.
///
/// Like [`AuthUser`] but yields `None` instead of rejecting when the token
/// is missing or invalid.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_parts(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        Ok(OptionalAuthUser(resolve_user(state, &token).await?))
    }
}
