//! Document API endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::Patch;
use serde_json::Value;

use crate::{
    ServerError,
    server::ServerState,
    types::{UpdateBody, ValueResponse},
};

/// Read the value stored at `path`.
pub async fn get(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Json<ValueResponse>, ServerError> {
    let value = state.store.get(&path).await?;
    Ok(Json(ValueResponse { value }))
}

/// Replace the value stored at `path`. A `null` body removes it.
pub async fn set(
    State(state): State<ServerState>,
    Path(path): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, ServerError> {
    state.store.set(&path, value).await?;
    tracing::debug!(%path, "document set");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.store.remove(&path).await?;
    tracing::debug!(%path, "document removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a multi-path update atomically.
pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<UpdateBody>,
) -> Result<StatusCode, ServerError> {
    if payload.updates.is_empty() {
        return Err(ServerError::Generic("updates must not be empty".to_string()));
    }
    let paths = payload.updates.len();
    state.store.update(Patch::from(payload.updates)).await?;
    tracing::debug!(paths, "documents updated");
    Ok(StatusCode::NO_CONTENT)
}
