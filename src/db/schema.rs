//! Database schema and migrations for filevault.
//!
//! Migrations are applied in order; the schema_version table records which
//! ones already ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: file entries (folders, files, images)
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    kind        TEXT NOT NULL CHECK (kind IN ('folder', 'file', 'image')),
    is_public   INTEGER NOT NULL DEFAULT 0,
    parent_id   INTEGER NOT NULL DEFAULT 0,  -- 0 = root
    local_path  TEXT,                         -- NULL for folders
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_parent_id ON files(parent_id, id);
CREATE INDEX idx_files_user_id ON files(user_id);
"#,
    // v3: artifact generation queue
    r#"
CREATE TABLE artifact_jobs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id       INTEGER NOT NULL,
    user_id       INTEGER NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending',  -- 'pending', 'leased', 'done', 'failed'
    attempts      INTEGER NOT NULL DEFAULT 0,
    last_error    TEXT,
    leased_until  TEXT,
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_artifact_jobs_status ON artifact_jobs(status, id);
"#,
];
