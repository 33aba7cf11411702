//! Test helpers for API tests.
//!
//! Builds the full router over an in-memory database, an in-process session
//! cache, and a temporary blob root.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderName;
use axum_test::{TestResponse, TestServer};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

use filevault::web::create_router;
use filevault::{
    AppState, BlobStore, Database, FileCatalog, MemoryCache, SessionStore, SqlArtifactQueue,
};

/// Header carrying the session token.
pub fn x_token() -> HeaderName {
    HeaderName::from_static("x-token")
}

/// A running API with handles on its backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub cache: Arc<MemoryCache>,
    pub queue: SqlArtifactQueue,
    pub blob_dir: TempDir,
}

/// Create a test server with an in-memory database.
pub async fn spawn_app() -> TestApp {
    let blob_dir = TempDir::new().expect("Failed to create blob dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let queue = SqlArtifactQueue::new(db.pool().clone(), Duration::from_secs(300), 5);
    let cache = Arc::new(MemoryCache::new(1000));

    let catalog = FileCatalog::new(
        db,
        BlobStore::new(blob_dir.path().join("files_manager")),
        Arc::new(queue.clone()),
    );
    let state = Arc::new(AppState::new(catalog, SessionStore::new(cache.clone())));

    let router = create_router(state.clone(), &[], 10 * 1024 * 1024);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        cache,
        queue,
        blob_dir,
    }
}

/// `Authorization` header value for basic credentials.
pub fn basic_auth(email: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{email}:{password}")))
}

/// Register a user and return the response body.
pub async fn register(server: &TestServer, email: &str, password: &str) -> Value {
    let response = server
        .post("/users")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.json::<Value>()
}

/// Log in with basic credentials and return the session token.
pub async fn connect(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .get("/connect")
        .add_header(AUTHORIZATION, basic_auth(email, password))
        .await;
    response.assert_status_ok();

    response.json::<Value>()["token"]
        .as_str()
        .expect("token missing from /connect response")
        .to_string()
}

/// Register and log in a user, returning `(user_id, token)`.
pub async fn sign_up(server: &TestServer, email: &str, password: &str) -> (i64, String) {
    let body = register(server, email, password).await;
    let id = body["id"].as_i64().expect("id missing from /users response");
    (id, connect(server, email, password).await)
}

/// POST /files with the given token and JSON body.
pub async fn upload(server: &TestServer, token: &str, body: Value) -> TestResponse {
    server
        .post("/files")
        .add_header(x_token(), token.to_string())
        .json(&body)
        .await
}

/// Error message from an API error body.
pub fn error_message(response: &TestResponse) -> String {
    response.json::<Value>()["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
