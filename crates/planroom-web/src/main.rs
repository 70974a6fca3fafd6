//! Planroom server
//!
//! Run with: cargo run -p planroom-web --bin planroom

use std::sync::Arc;

use planroom_db::{LocalBlobStore, LogNotifier};
use planroom_web::{config::Config, router::build_router, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("planroom=debug,info")),
        )
        .init();

    let config = Config::load()?;
    info!(
        backend = ?config.llm.backend,
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        upload_dir = %config.storage.upload_dir,
        "Configuration loaded"
    );

    let backend = config.build_backend()?;
    let blobs = Arc::new(LocalBlobStore::new(&config.storage.upload_dir));
    let state = AppState::new(&config, backend, blobs, Arc::new(LogNotifier));

    let engine = state.availability.refresh(state.backend.as_ref()).await;
    info!(state = ?engine, "Inference engine checked");
    if !state.availability.is_available().await {
        warn!("Inference engine unavailable; extraction will use label patterns until refreshed");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
