use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use filevault::{
    cache, AppState, BlobStore, Config, Database, FileCatalog, SessionStore, SqlArtifactQueue,
    WebServer,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = filevault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filevault::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("filevault stopped: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> filevault::Result<()> {
    config.validate()?;

    info!("filevault - file storage service");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path, config.database.max_connections).await?;

    let sessions = SessionStore::with_ttl(
        cache::from_config(&config.cache)?,
        Duration::from_secs(config.cache.session_ttl_secs),
    );

    let queue = SqlArtifactQueue::new(
        db.pool().clone(),
        Duration::from_secs(config.artifacts.lease_secs),
        config.artifacts.max_attempts,
    )
    .with_variant_sizes(config.artifacts.variant_sizes.clone());

    info!("Blob storage at {}", config.files.storage_path);
    let catalog = FileCatalog::new(
        db,
        BlobStore::new(&config.files.storage_path),
        Arc::new(queue),
    )
    .with_max_upload_bytes(config.max_upload_bytes());

    let server = WebServer::new(&config.server, AppState::new(catalog, sessions))?
        .with_max_upload_bytes(config.max_upload_bytes());

    server.run().await?;
    Ok(())
}
