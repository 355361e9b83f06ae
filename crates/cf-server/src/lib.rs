//! cf-server: HTTP API for clipforge.
//!
//! A thin axum layer over [`cf_pipeline::JobPipeline`]:
//!
//! - `POST /api/cut` runs a job and returns the output reference
//! - `GET /files/{filename}` streams a finished clip (Range aware)
//! - `POST /api/cleanup` forces a retention pass
//! - health, tool availability, and an OpenAPI document

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use cf_core::config::Config;
use cf_pipeline::FsOutputStore;

use crate::context::AppContext;

/// Start the clipforge server and run until SIGINT / SIGTERM.
///
/// # Errors
///
/// Fails if the data directories cannot be created, ffmpeg is missing, or the
/// listen address cannot be bound.
pub async fn start(config: Config) -> cf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    if config.fetcher.endpoint.is_none() {
        tracing::warn!(
            "No download service configured: every http(s) cut will answer 502 until fetcher.endpoint is set"
        );
    }

    let outputs = FsOutputStore::new(config.storage.output_dir(), &config.encode.container);
    outputs.ensure_root().await.map_err(|e| {
        cf_core::Error::Internal(format!("Failed to create {}: {e}", outputs.root().display()))
    })?;
    let scratch = config.storage.scratch_dir();
    tokio::fs::create_dir_all(&scratch).await.map_err(|e| {
        cf_core::Error::Internal(format!("Failed to create {}: {e}", scratch.display()))
    })?;
    tracing::info!("Data directory: {}", config.storage.data_dir.display());

    let tools = Arc::new(cf_av::ToolRegistry::discover(&config.tools));
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}", info.name);
        }
    }

    // Server callers may only reference remote media.
    let pipeline = cf_pipeline::build_pipeline(&config, tools.clone(), false)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| cf_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext::new(config, pipeline, tools);
    let app = router::build_router(ctx, static_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| cf_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| cf_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
