use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::gateway::{handle_request, GatewayState};
use crate::translation::WorkersAiTranslator;

/// Build the router. There are no routes: every path and method goes to the
/// gateway handler, which does its own method gating.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .fallback(handle_request)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the Workers AI translator into gateway state
pub fn state_from_config(config: &Config) -> Result<GatewayState> {
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;
    let translator = WorkersAiTranslator::new(client, config);
    info!("Using translation model {}", config.workers_ai_model);

    Ok(GatewayState::new(config.access_key.clone(), Arc::new(translator)))
}

/// Serve on an already-bound listener until Ctrl-C
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Translation gateway listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Translation gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
