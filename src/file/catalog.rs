//! File catalog for filevault.
//!
//! Owns users and file entries: registration, uploads into the folder
//! hierarchy, visibility, and permissioned reads. Entries that are neither
//! owned by nor visible to a requester are reported as not found.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::entry::{EntryKind, FileEntry, NewEntry};
use super::repository::{EntryRecord, FileRepository};
use super::storage::BlobStore;
use crate::artifact::{ArtifactJob, ArtifactQueue};
use crate::auth::{hash_password, verify_password};
use crate::db::{Database, NewUser, User, UserRepository};
use crate::{Result, VaultError};

/// Default maximum decoded upload size (50MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Object counts reported by the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub users: i64,
    pub files: i64,
}

/// Users, entries, and their content.
#[derive(Clone)]
pub struct FileCatalog {
    db: Database,
    blobs: BlobStore,
    queue: Arc<dyn ArtifactQueue>,
    max_upload_bytes: usize,
}

fn validation(message: &str) -> VaultError {
    VaultError::Validation(message.to_string())
}

fn not_found() -> VaultError {
    VaultError::NotFound("file".to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl FileCatalog {
    pub fn new(db: Database, blobs: BlobStore, queue: Arc<dyn ArtifactQueue>) -> Self {
        Self {
            db,
            blobs,
            queue,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Set the maximum decoded upload size.
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Register a user. Only the Argon2 hash of the password is stored.
    pub async fn create_user(&self, email: Option<&str>, password: Option<&str>) -> Result<User> {
        let email = non_empty(email).ok_or_else(|| validation("Missing email"))?;
        let password = non_empty(password).ok_or_else(|| validation("Missing password"))?;

        let repo = UserRepository::new(self.db.pool());
        if repo.email_exists(email).await? {
            return Err(VaultError::Conflict("Already exist".to_string()));
        }

        let password_hash =
            hash_password(password).map_err(|e| VaultError::Internal(e.to_string()))?;
        let user = repo.create(&NewUser::new(email, password_hash)).await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check basic credentials.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = UserRepository::new(self.db.pool())
            .get_by_email(email)
            .await?
            .ok_or_else(|| VaultError::Auth("Unauthorized".to_string()))?;

        if verify_password(password, &user.password).is_err() {
            debug!(user_id = user.id, "Password mismatch");
            return Err(VaultError::Auth("Unauthorized".to_string()));
        }
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        UserRepository::new(self.db.pool()).get_by_id(user_id).await
    }

    /// Create a folder, file, or image owned by `owner_id`.
    ///
    /// Input is fully validated before anything is written. File and image
    /// uploads store their bytes first, then the metadata, then enqueue an
    /// artifact job. A failed enqueue does not fail the upload.
    pub async fn create_entry(&self, owner_id: i64, new_entry: NewEntry) -> Result<FileEntry> {
        let name = non_empty(new_entry.name.as_deref()).ok_or_else(|| validation("Missing name"))?;
        let kind: EntryKind = non_empty(new_entry.kind.as_deref())
            .ok_or_else(|| validation("Missing type"))?
            .parse()
            .map_err(|_| validation("Invalid type"))?;

        let content = if kind.is_folder() {
            None
        } else {
            let data =
                non_empty(new_entry.data.as_deref()).ok_or_else(|| validation("Missing data"))?;
            let bytes = BASE64
                .decode(data.trim())
                .map_err(|_| validation("Invalid data"))?;
            if bytes.len() > self.max_upload_bytes {
                return Err(validation("Data too large"));
            }
            Some(bytes)
        };

        let repo = FileRepository::new(self.db.pool());
        if new_entry.parent_id != 0 {
            let parent = repo
                .get_by_id(new_entry.parent_id)
                .await?
                .ok_or_else(|| validation("Parent not found"))?;
            if !parent.kind.is_folder() {
                return Err(validation("Parent is not a folder"));
            }
        }

        let local_path = match &content {
            Some(bytes) => Some(self.blobs.put(bytes).await?),
            None => None,
        };

        let record = EntryRecord {
            user_id: owner_id,
            name: name.to_string(),
            kind,
            is_public: new_entry.is_public,
            parent_id: new_entry.parent_id,
            local_path,
        };

        let entry = match repo.create(&record).await {
            Ok(entry) => entry,
            Err(e) => {
                if let Some(path) = &record.local_path {
                    error!(path = %path, error = %e, "Metadata write failed; blob left orphaned");
                }
                return Err(e);
            }
        };

        info!(
            file_id = entry.id,
            user_id = owner_id,
            kind = %entry.kind,
            "Entry created"
        );

        if !entry.kind.is_folder() {
            if let Err(e) = self
                .queue
                .enqueue(ArtifactJob::new(entry.id, owner_id))
                .await
            {
                warn!(file_id = entry.id, error = %e, "Failed to enqueue artifact job");
            }
        }

        Ok(entry)
    }

    /// Look up an entry the requester owns or that is public.
    pub async fn get_entry(&self, requester_id: i64, file_id: i64) -> Result<FileEntry> {
        FileRepository::new(self.db.pool())
            .get_by_id(file_id)
            .await?
            .filter(|entry| entry.is_readable_by(Some(requester_id)))
            .ok_or_else(not_found)
    }

    /// One page of the entries directly under `parent_id` (0 = root).
    pub async fn list_entries(
        &self,
        requester_id: i64,
        parent_id: i64,
        page: i64,
    ) -> Result<Vec<FileEntry>> {
        debug!(requester_id, parent_id, page, "Listing entries");
        FileRepository::new(self.db.pool())
            .list_by_parent(parent_id, page)
            .await
    }

    /// Publish or unpublish an entry. Only the owner may do so.
    pub async fn set_visibility(
        &self,
        requester_id: i64,
        file_id: i64,
        is_public: bool,
    ) -> Result<FileEntry> {
        let repo = FileRepository::new(self.db.pool());
        if !repo.set_public(file_id, requester_id, is_public).await? {
            return Err(not_found());
        }

        debug!(file_id, is_public, "Visibility changed");
        repo.get_by_id(file_id).await?.ok_or_else(not_found)
    }

    /// Read the content of an entry, or of its derivative at `size`.
    ///
    /// Anonymous requesters can read public entries only.
    pub async fn read_content(
        &self,
        requester_id: Option<i64>,
        file_id: i64,
        size: u32,
    ) -> Result<(FileEntry, Vec<u8>)> {
        let entry = FileRepository::new(self.db.pool())
            .get_by_id(file_id)
            .await?
            .filter(|entry| entry.is_readable_by(requester_id))
            .ok_or_else(not_found)?;

        if entry.kind.is_folder() {
            return Err(validation("A folder doesn't have content"));
        }

        let path = entry.local_path.as_deref().ok_or_else(not_found)?;
        let content = self.blobs.get(&BlobStore::variant_path(path, size)).await?;
        Ok((entry, content))
    }

    /// Count users and entries.
    pub async fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            users: self.db.count_users().await?,
            files: self.db.count_files().await?,
        })
    }
}
