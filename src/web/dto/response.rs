//! Response DTOs for Web API.

use serde::Serialize;

use crate::db::User;
use crate::file::{EntryKind, FileEntry};

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Session token, sent back in `X-Token`.
    pub token: String,
}

/// File entry as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub is_public: bool,
    pub parent_id: i64,
    /// Only reported in the upload response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl EntryResponse {
    /// Upload response; includes the blob path for files and images.
    pub fn created(entry: FileEntry) -> Self {
        let local_path = entry.local_path.clone();
        Self {
            local_path,
            ..Self::from(entry)
        }
    }
}

impl From<FileEntry> for EntryResponse {
    fn from(entry: FileEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            name: entry.name,
            kind: entry.kind,
            is_public: entry.is_public,
            parent_id: entry.parent_id,
            local_path: None,
        }
    }
}

/// Backing store liveness.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub db: bool,
    pub cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind, local_path: Option<&str>) -> FileEntry {
        FileEntry {
            id: 4,
            user_id: 2,
            name: "a.txt".to_string(),
            kind,
            is_public: false,
            parent_id: 0,
            local_path: local_path.map(str::to_string),
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(EntryResponse::from(entry(
            EntryKind::File,
            Some("/tmp/files_manager/x"),
        )))
        .unwrap();

        assert_eq!(json["id"], 4);
        assert_eq!(json["userId"], 2);
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["type"], "file");
        assert_eq!(json["isPublic"], false);
        assert_eq!(json["parentId"], 0);
        assert!(json.get("localPath").is_none());
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_created_entry_has_local_path() {
        let json = serde_json::to_value(EntryResponse::created(entry(
            EntryKind::Image,
            Some("/tmp/files_manager/x"),
        )))
        .unwrap();
        assert_eq!(json["localPath"], "/tmp/files_manager/x");

        let json =
            serde_json::to_value(EntryResponse::created(entry(EntryKind::Folder, None))).unwrap();
        assert!(json.get("localPath").is_none());
    }

    #[test]
    fn test_user_response_hides_password() {
        let json = serde_json::to_value(UserResponse::from(User {
            id: 1,
            email: "bob@dylan.com".to_string(),
            password: "$argon2id$...".to_string(),
            created_at: String::new(),
        }))
        .unwrap();

        assert_eq!(json["email"], "bob@dylan.com");
        assert!(json.get("password").is_none());
    }
}
