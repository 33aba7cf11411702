//! File entry repository for filevault.

use super::entry::{EntryKind, FileEntry};
use crate::db::DbPool;
use crate::{Result, VaultError};

/// Entries per listing page.
pub const PAGE_SIZE: i64 = 20;

const ENTRY_COLUMNS: &str =
    "id, user_id, name, kind, is_public, parent_id, local_path, created_at";

/// Validated row ready for insertion.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub user_id: i64,
    pub name: String,
    pub kind: EntryKind,
    pub is_public: bool,
    pub parent_id: i64,
    pub local_path: Option<String>,
}

/// Repository for file entry records.
pub struct FileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert an entry and return the stored row.
    pub async fn create(&self, record: &EntryRecord) -> Result<FileEntry> {
        let result = sqlx::query(
            "INSERT INTO files (user_id, name, kind, is_public, parent_id, local_path)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.user_id)
        .bind(&record.name)
        .bind(record.kind.as_str())
        .bind(record.is_public)
        .bind(record.parent_id)
        .bind(&record.local_path)
        .execute(self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Get an entry by ID, regardless of owner.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileEntry>> {
        let entry = sqlx::query_as::<_, FileEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM files WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(entry)
    }

    /// List one page of entries whose parent is exactly `parent_id`.
    pub async fn list_by_parent(&self, parent_id: i64, page: i64) -> Result<Vec<FileEntry>> {
        let offset = page.max(0).saturating_mul(PAGE_SIZE);
        let entries = sqlx::query_as::<_, FileEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM files
             WHERE parent_id = $1
             ORDER BY id ASC
             LIMIT $2 OFFSET $3"
        ))
        .bind(parent_id)
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Set visibility of an entry owned by `user_id`.
    ///
    /// Returns `false` when no such entry exists for that owner.
    pub async fn set_public(&self, id: i64, user_id: i64, is_public: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET is_public = $1 WHERE id = $2 AND user_id = $3")
            .bind(is_public)
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("owner@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    fn folder(user_id: i64, name: &str, parent_id: i64) -> EntryRecord {
        EntryRecord {
            user_id,
            name: name.to_string(),
            kind: EntryKind::Folder,
            is_public: false,
            parent_id,
            local_path: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, user_id) = setup().await;
        let repo = FileRepository::new(db.pool());

        let record = EntryRecord {
            user_id,
            name: "a.txt".to_string(),
            kind: EntryKind::File,
            is_public: true,
            parent_id: 0,
            local_path: Some("/tmp/files_manager/x".to_string()),
        };
        let entry = repo.create(&record).await.unwrap();

        assert_eq!(entry.kind, EntryKind::File);
        assert!(entry.is_public);
        assert_eq!(entry.local_path.as_deref(), Some("/tmp/files_manager/x"));

        let fetched = repo.get_by_id(entry.id).await.unwrap().unwrap();
        assert_eq!(fetched, entry);
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (db, user_id) = setup().await;
        let repo = FileRepository::new(db.pool());

        for i in 0..25 {
            repo.create(&folder(user_id, &format!("f{i}"), 0)).await.unwrap();
        }

        let first = repo.list_by_parent(0, 0).await.unwrap();
        let second = repo.list_by_parent(0, 1).await.unwrap();
        let third = repo.list_by_parent(0, 2).await.unwrap();

        assert_eq!(first.len(), 20);
        assert_eq!(second.len(), 5);
        assert!(third.is_empty());
        assert_eq!(first[0].name, "f0");
        assert_eq!(second[0].name, "f20");
        assert!(first.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_list_by_parent_is_exact() {
        let (db, user_id) = setup().await;
        let repo = FileRepository::new(db.pool());

        let parent = repo.create(&folder(user_id, "parent", 0)).await.unwrap();
        repo.create(&folder(user_id, "child", parent.id)).await.unwrap();

        let root = repo.list_by_parent(0, 0).await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "parent");

        let inside = repo.list_by_parent(parent.id, 0).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name, "child");

        assert!(repo.list_by_parent(12345, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_public_requires_owner() {
        let (db, user_id) = setup().await;
        let repo = FileRepository::new(db.pool());
        let entry = repo.create(&folder(user_id, "f", 0)).await.unwrap();

        assert!(!repo.set_public(entry.id, user_id + 1, true).await.unwrap());
        assert!(repo.set_public(entry.id, user_id, true).await.unwrap());
        assert!(repo.get_by_id(entry.id).await.unwrap().unwrap().is_public);

        assert!(!repo.set_public(999, user_id, true).await.unwrap());
    }
}
