//! # boxstore-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the boxstore artifact registry.
//! Binds to a configurable port (default 8080).

use boxstore_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment with fallback defaults.
    let config = AppConfig::from_env();
    let port = config.port;

    tracing::info!(
        root = %config.storage.root.display(),
        max_artifact_size = ?config.storage.max_artifact_size,
        timeout_secs = config.storage.upload_timeout.as_secs(),
        "storage configuration loaded"
    );

    // The storage root must exist before the first transfer.
    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .map_err(|e| {
            tracing::error!(root = %config.storage.root.display(), "cannot create storage root: {e}");
            e
        })?;

    let state = AppState::with_config(config);
    let app = boxstore_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("boxstore API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
