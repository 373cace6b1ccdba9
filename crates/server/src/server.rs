use axum::{
    Json, Router,
    routing::{get, patch},
};

use std::sync::Arc;

use crate::{documents, types::HealthResponse, watch};
use engine::DocumentStore;

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn DocumentStore>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/db", patch(documents::update))
        .route(
            "/db/{*path}",
            get(documents::get)
                .put(documents::set)
                .delete(documents::remove),
        )
        .route("/watch/{*path}", get(watch::watch))
        .with_state(state)
}

pub async fn run_with_listener(
    store: Arc<dyn DocumentStore>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState { store })).await
}

pub fn spawn_with_listener(
    store: Arc<dyn DocumentStore>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(store, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
