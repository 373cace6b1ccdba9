use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod documents;
mod server;
mod watch;

pub mod types {
    pub use api_types::documents::{UpdateBody, ValueResponse};
    pub use api_types::status::{ErrorResponse, HealthResponse};
    pub use api_types::{ERROR_EVENT, SNAPSHOT_EVENT};
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        _ => match err.kind() {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err.kind() {
        ErrorKind::Transport => {
            tracing::error!("store error: {err}");
            "internal server error".to_string()
        }
        _ => err.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, kind) = match self {
            ServerError::Engine(err) => {
                let kind = err.kind();
                (
                    status_for_engine_error(&err),
                    message_for_engine_error(err),
                    kind,
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err, ErrorKind::Validation),
        };

        let body = types::ErrorResponse {
            error,
            kind: kind.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
