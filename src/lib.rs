//! filevault - multi-tenant file storage service
//!
//! Users upload files, images, and folders into a shared hierarchy over a
//! JSON HTTP API, control their visibility, and read content back together
//! with derivatives generated by an external worker.

pub mod artifact;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use artifact::{ArtifactJob, ArtifactQueue, ClaimedJob, SqlArtifactQueue};
pub use auth::{hash_password, verify_password, PasswordError, SessionStore};
pub use cache::{KeyValueCache, MemoryCache};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{Result, VaultError};
pub use file::{BlobStore, EntryKind, FileCatalog, FileEntry, NewEntry};
pub use web::{AppState, WebServer};
