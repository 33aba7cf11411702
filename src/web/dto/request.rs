//! Request DTOs for Web API.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::file::NewEntry;
use crate::web::error::ApiError;

/// JSON body extractor whose rejections use the API error format.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::payload_too_large("Request body too large"))
            }
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                Err(ApiError::bad_request(rejection.body_text()))
            }
        }
    }
}

/// User registration request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Numeric ID that clients may send as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            IdValue::Number(n) => Some(*n),
            IdValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// File upload request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Base64-encoded content.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub parent_id: Option<IdValue>,
}

impl UploadRequest {
    /// Convert into a catalog upload.
    ///
    /// A parent ID that is not a number cannot name a folder.
    pub fn into_new_entry(self) -> Result<NewEntry, ApiError> {
        let parent_id = match &self.parent_id {
            None => 0,
            Some(value) => value
                .as_id()
                .ok_or_else(|| ApiError::bad_request("Parent not found"))?,
        };

        Ok(NewEntry {
            name: self.name,
            kind: self.kind,
            data: self.data,
            is_public: self.is_public,
            parent_id,
        })
    }
}

/// Query parameters for file listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl ListQuery {
    /// Parent to list; `None` when the value cannot be an entry ID.
    pub fn parent_id(&self) -> Option<i64> {
        match self.parent_id.as_deref().map(str::trim) {
            None | Some("") => Some(0),
            Some(raw) => raw.parse().ok(),
        }
    }

    /// Zero-based page; unparseable values fall back to the first page.
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map(|p| p.max(0))
            .unwrap_or(0)
    }
}

/// Query parameters for content download.
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    #[serde(default)]
    pub size: Option<String>,
}

impl DataQuery {
    /// Requested derivative size; `None` when no blob can have this suffix.
    pub fn size(&self) -> Option<u32> {
        match self.size.as_deref().map(str::trim) {
            None | Some("") => Some(0),
            Some(raw) => raw.parse().ok(),
        }
    }
}
