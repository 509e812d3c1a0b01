//! HTTP router and listener.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::hub::Hub;
use crate::session::handle_socket;

/// Build the application router around a shared hub.
///
/// `/ws` and `/health` take priority; every other path is served from the
/// static asset directory.
pub fn router(hub: Arc<Hub>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

/// Serve on an already bound listener until the future is dropped or the
/// listener fails.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let hub = Arc::new(Hub::new());
    let app = router(hub, &config);

    let addr = listener.local_addr()?;
    info!("InkRelay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Bind the configured address and serve.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    serve(listener, config).await
}

/// Health check
async fn health(State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": hub.peer_count(),
        "history": hub.history_len(),
    }))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
