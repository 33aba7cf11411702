//! File entry types for filevault.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Kind of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Container for other entries; has no content.
    Folder,
    /// Opaque file.
    File,
    /// Image; derivatives are generated for it.
    Image,
}

impl EntryKind {
    /// Convert to the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Folder => "folder",
            EntryKind::File => "file",
            EntryKind::Image => "image",
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, EntryKind::Folder)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(EntryKind::Folder),
            "file" => Ok(EntryKind::File),
            "image" => Ok(EntryKind::Image),
            _ => Err(format!("unknown entry kind: {s}")),
        }
    }
}

impl TryFrom<String> for EntryKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A folder, file, or image in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileEntry {
    /// Unique entry ID.
    pub id: i64,
    /// Owner.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    #[sqlx(try_from = "String")]
    pub kind: EntryKind,
    /// Readable by anyone when set.
    pub is_public: bool,
    /// Containing folder ID, 0 for the root.
    pub parent_id: i64,
    /// Blob path; `None` for folders.
    pub local_path: Option<String>,
    pub created_at: String,
}

impl FileEntry {
    /// Whether `user_id` may read this entry.
    pub fn is_readable_by(&self, user_id: Option<i64>) -> bool {
        self.is_public || user_id == Some(self.user_id)
    }
}

/// Upload request, before validation.
///
/// `kind` and `data` stay raw so the catalog can report which field is
/// missing or malformed.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub name: Option<String>,
    pub kind: Option<String>,
    /// Base64-encoded content; required unless the entry is a folder.
    pub data: Option<String>,
    pub is_public: bool,
    pub parent_id: i64,
}

impl NewEntry {
    /// Create an upload of `kind` named `name` at the root.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Set the base64 payload.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Mark the entry public.
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}
