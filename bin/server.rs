// HBNB - Web Server
// REST API under /api/v1 and HTML pages, served with Axum

use anyhow::{Context, Result};
use axum::{extract::Request, ServiceExt};
use hbnb::server::{app, AppState};
use hbnb::{storage, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting HBNB server v{}", hbnb::VERSION);

    if let Err(e) = run().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("invalid HBNB_* configuration")?;
    let storage = storage::open(&config).context("failed to open storage")?;

    let router = app(AppState::new(storage));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("   API:   http://{}/api/v1/status", addr);
    info!("   Pages: http://{}/hbnb", addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(router))
        .await
        .context("server error")?;
    Ok(())
}
