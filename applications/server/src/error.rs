/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadence_core::CadenceError;
use cadence_playback::PlaybackError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors returned by the `/api` routes
///
/// Rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] CadenceError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cadence_storage::StorageError> for ServerError {
    fn from(err: cadence_storage::StorageError) -> Self {
        ServerError::Database(err.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ServerError::Database(ref e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            ServerError::Database(CadenceError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ServerError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ServerError::Playback(e) => {
                let status = playback_status(&e);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("Playback error: {}", e);
                } else {
                    tracing::warn!(error = %e, "Playback request failed");
                }
                (status, e.to_string())
            }
            ServerError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Errors returned by the root-level playback control routes
///
/// Rendered as a bare JSON string, the shape existing clients expect.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Volume step hit a bound; the clamped value was still applied
    #[error("{0}")]
    LimitReached(&'static str),
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = match &self {
            ControlError::Playback(e) => playback_status(e),
            ControlError::LimitReached(_) => StatusCode::BAD_REQUEST,
        };

        let message = match &self {
            ControlError::Playback(e) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Playback error: {}", e);
                "Playback failed".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(message)).into_response()
    }
}

fn playback_status(err: &PlaybackError) -> StatusCode {
    match err {
        PlaybackError::TrackNotFound(_)
        | PlaybackError::PlaylistNotFound(_)
        | PlaybackError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
        PlaybackError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        PlaybackError::Unreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PlaybackError::Repository(e) if e.is_not_found() => StatusCode::NOT_FOUND,
        PlaybackError::Repository(_) | PlaybackError::Engine(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::TrackId;

    #[test]
    fn playback_errors_map_to_legacy_statuses() {
        assert_eq!(
            playback_status(&PlaybackError::TrackNotFound(TrackId::new(7))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            playback_status(&PlaybackError::ResourceNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            playback_status(&PlaybackError::nothing_playing()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            playback_status(&PlaybackError::engine("device gone")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn limit_reached_is_bad_request() {
        let response = ControlError::LimitReached("Volume cannot go above 100").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
