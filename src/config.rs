//! Configuration module for filevault.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, VaultError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty = any origin, no credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/filevault.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Session cache backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process cache (single node only).
    #[default]
    Memory,
    /// Redis server (requires the `redis` feature).
    Redis,
}

/// Session cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Which backend stores session tokens.
    #[serde(default)]
    pub backend: CacheBackend,
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Maximum number of entries kept by the memory backend.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_cache_capacity() -> u64 {
    100_000
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            max_capacity: default_cache_capacity(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Root directory for stored blobs.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum decoded upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "/tmp/files_manager".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Artifact pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Widths the worker renders derivatives at.
    #[serde(default = "default_variant_sizes")]
    pub variant_sizes: Vec<u32>,
    /// Seconds a claimed job stays leased before it is redelivered.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
    /// Attempts before a failing job is parked.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
}

fn default_variant_sizes() -> Vec<u32> {
    crate::artifact::DEFAULT_VARIANT_SIZES.to_vec()
}

fn default_lease_secs() -> u64 {
    300
}

fn default_max_attempts() -> i64 {
    5
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            variant_sizes: default_variant_sizes(),
            lease_secs: default_lease_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filevault.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Artifact pipeline configuration.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(VaultError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| VaultError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FOLDER_PATH`: blob storage root
    /// - `FILEVAULT_DB_PATH`: SQLite database path
    /// - `FILEVAULT_REDIS_URL`: Redis URL (also switches the cache backend to Redis)
    /// - `PORT`: HTTP port
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("FOLDER_PATH") {
            self.files.storage_path = path;
        }
        if let Some(path) = non_empty_env("FILEVAULT_DB_PATH") {
            self.database.path = path;
        }
        if let Some(url) = non_empty_env("FILEVAULT_REDIS_URL") {
            self.cache.redis_url = url;
            self.cache.backend = CacheBackend::Redis;
        }
        if let Some(port) = non_empty_env("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cache.session_ttl_secs == 0 {
            return Err(VaultError::Config(
                "cache.session_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.files.storage_path.trim().is_empty() {
            return Err(VaultError::Config(
                "files.storage_path must not be empty".to_string(),
            ));
        }
        if self.artifacts.variant_sizes.iter().any(|s| *s == 0) {
            return Err(VaultError::Config(
                "artifacts.variant_sizes must not contain 0".to_string(),
            ));
        }
        #[cfg(not(feature = "redis"))]
        if self.cache.backend == CacheBackend::Redis {
            return Err(VaultError::Config(
                "cache.backend = \"redis\" requires the `redis` feature".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum decoded upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.files.max_upload_size_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(1024 * 1024)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.path, "data/filevault.db");
        assert_eq!(config.database.max_connections, 8);

        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.session_ttl_secs, 86400);

        assert_eq!(config.files.storage_path, "/tmp/files_manager");
        assert_eq!(config.files.max_upload_size_mb, 50);

        assert_eq!(config.artifacts.variant_sizes, vec![500, 250, 100]);
        assert_eq!(config.artifacts.lease_secs, 300);
        assert_eq!(config.artifacts.max_attempts, 5);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/filevault.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:3000"]

[database]
path = "custom/db.sqlite"
max_connections = 2

[cache]
backend = "redis"
redis_url = "redis://cache:6379"
max_capacity = 10
session_ttl_secs = 60

[files]
storage_path = "custom/files"
max_upload_size_mb = 5

[artifacts]
variant_sizes = [320, 64]
lease_secs = 30
max_attempts = 2

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.redis_url, "redis://cache:6379");
        assert_eq!(config.cache.max_capacity, 10);
        assert_eq!(config.cache.session_ttl_secs, 60);
        assert_eq!(config.files.storage_path, "custom/files");
        assert_eq!(config.max_upload_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.artifacts.variant_sizes, vec![320, 64]);
        assert_eq!(config.artifacts.lease_secs, 30);
        assert_eq!(config.artifacts.max_attempts, 2);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_max_upload_bytes_saturates() {
        let mut config = Config::default();
        config.files.max_upload_size_mb = u64::MAX;
        assert_eq!(config.max_upload_bytes(), usize::MAX);

        config.files.max_upload_size_mb = 0;
        assert_eq!(config.max_upload_bytes(), 0);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[files]
storage_path = "/srv/blobs"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.files.storage_path, "/srv/blobs");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cache.session_ttl_secs, 86400);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(VaultError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(VaultError::Io(_))));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.cache.session_ttl_secs = 0;

        let result = config.validate();
        assert!(matches!(result, Err(VaultError::Config(msg)) if msg.contains("session_ttl_secs")));
    }

    #[test]
    fn test_validate_zero_variant_size() {
        let mut config = Config::default();
        config.artifacts.variant_sizes = vec![100, 0];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_apply_env_overrides_folder_path() {
        let original = std::env::var("FOLDER_PATH").ok();

        std::env::set_var("FOLDER_PATH", "/var/lib/filevault");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.files.storage_path, "/var/lib/filevault");

        std::env::set_var("FOLDER_PATH", "");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.files.storage_path, "/tmp/files_manager");

        if let Some(val) = original {
            std::env::set_var("FOLDER_PATH", val);
        } else {
            std::env::remove_var("FOLDER_PATH");
        }
    }
}
