//! File management for filevault.
//!
//! - Folder hierarchy with a shared root (parent ID 0)
//! - Per-entry visibility, private by default
//! - UUID-named blobs on local disk

mod catalog;
mod entry;
mod repository;
mod storage;

pub use catalog::{CatalogStats, FileCatalog, DEFAULT_MAX_UPLOAD_BYTES};
pub use entry::{EntryKind, FileEntry, NewEntry};
pub use repository::{EntryRecord, FileRepository, PAGE_SIZE};
pub use storage::BlobStore;
