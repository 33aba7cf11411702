//! Authentication module for filevault.
//!
//! - Argon2id password hashing
//! - Opaque session tokens stored in an expiring cache

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::{SessionStore, DEFAULT_SESSION_TTL_SECS, SESSION_KEY_PREFIX};
