//! API handlers.

pub mod app;
pub mod auth;
pub mod file;
pub mod user;

pub use app::*;
pub use auth::*;
pub use file::*;
pub use user::*;

use crate::auth::SessionStore;
use crate::file::FileCatalog;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, entries, and content.
    pub catalog: FileCatalog,
    /// Session tokens.
    pub sessions: SessionStore,
}

impl AppState {
    /// Create a new application state.
    pub fn new(catalog: FileCatalog, sessions: SessionStore) -> Self {
        Self { catalog, sessions }
    }
}
