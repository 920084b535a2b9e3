//! JSON-RPC over HTTP.
//!
//! `POST /mcp` takes one JSON-RPC message and answers with the reply, or
//! `202 Accepted` for notifications. `GET /health` reports liveness.

use super::McpServer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Build the HTTP router.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle_rpc))
        .route("/health", get(health))
        .with_state(server)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run(server: Arc<McpServer>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Serving MCP over HTTP");

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP transport stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn handle_rpc(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_raw(&body).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
