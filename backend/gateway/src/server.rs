//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use scribe_compaction::CompactionEngine;
use scribe_store::MessageStore;

use crate::{compaction_api, health_api, messages_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn MessageStore>,
    pub engine: Arc<CompactionEngine>,
}

impl GatewayState {
    pub fn new(store: Arc<dyn MessageStore>, engine: Arc<CompactionEngine>) -> Self {
        Self { store, engine }
    }
}

/// Build the Axum router with all API routes.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/health", get(health_api::get_health))
        .route(
            "/session",
            get(messages_api::create_session).post(messages_api::create_session),
        )
        .route(
            "/messages/:session_id",
            get(messages_api::list_messages).post(messages_api::append_message),
        )
        .route("/messages/:session_id/:id", delete(messages_api::truncate_messages))
        .route("/context/:session_id", get(compaction_api::get_context))
        .route(
            "/internal/maybe-summarize/:session_id",
            post(compaction_api::trigger_compaction),
        )
        .with_state(state)
}

/// Starts the main Axum HTTP server for the gateway.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Gateway HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
