//! Timelens Server - REST API for matching street photos to historical photographs
//!
//! Endpoints:
//! - POST /match - Match an uploaded photo and location signals
//! - GET /catalog/near - Browse catalog entries around a point
//! - GET /catalog/{id} - Fetch a catalog entry
//! - GET /health, GET /ready - Monitoring
//! - GET /docs - Swagger UI

use std::net::SocketAddr;

use timelens_server::{create_router_with_config, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("timelens=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Starting timelens-server v{}", env!("CARGO_PKG_VERSION"));

    let app = create_router_with_config(&config)?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API docs at http://{}/docs/", addr);

    // Peer addresses are needed by the rate limiter's IP key extractor
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
