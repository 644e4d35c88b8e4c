//! Eventide API server entry point.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use eventide_api::error::AppError;
use eventide_api::state::AppState;
use eventide_content::application::command_handlers::handle_load_bundle;
use eventide_runtime::{EventRuntime, RuntimeConfig, RuntimeServices};
use eventide_world_state::application::file_repository::JsonFileSaveRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Eventide API server");

    // Read configuration from environment.
    let config = RuntimeConfig::from_env()?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
    let save_dir = std::env::var("EVENTIDE_SAVE_DIR").unwrap_or_else(|_| "saves".to_string());

    // Build application state.
    let runtime = EventRuntime::new(config, RuntimeServices::headless());
    let app_state = AppState::new(
        Arc::clone(&runtime),
        Arc::new(JsonFileSaveRepository::new(save_dir)),
    );

    if let Ok(content_path) = std::env::var("EVENTIDE_CONTENT_PATH") {
        let loaded = handle_load_bundle(Path::new(&content_path)).await?;
        let summary = app_state.install(loaded)?;
        tracing::info!(
            path = %content_path,
            content_hash = %summary.content_hash,
            "initial script bundle installed"
        );
    }

    let app = eventide_api::app(app_state);

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    runtime.shutdown().await;

    Ok(())
}
