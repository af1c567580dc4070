//! Error types for persona-discovery
//!
//! `DiscoveryError` is the fatal taxonomy surfaced to callers: structural
//! problems with sessions and actions. Data simply being unavailable is never
//! an error here; searches return empty lists and extractions degrade to a
//! fallback draft instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Fatal discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Action type is not part of the state machine
    #[error("Unknown action type: {0}")]
    UnknownAction(String),

    /// Action type is known but its payload does not fit
    #[error("Malformed action: {0}")]
    MalformedAction(String),

    /// Session already completed or abandoned
    #[error("Session {0} is finished")]
    SessionFinished(Uuid),

    #[error("Genre not selected for session {0}")]
    GenreNotSelected(Uuid),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Draft still invalid after the one-shot fix-up
    #[error("Validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),

    /// Generation service failed where no fallback exists
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] crate::extraction::ExtractionError),

    /// Storage, serialisation or configuration error
    #[error(transparent)]
    Common(#[from] persona_common::Error),
}

impl From<sqlx::Error> for DiscoveryError {
    fn from(err: sqlx::Error) -> Self {
        DiscoveryError::Common(persona_common::Error::Database(err))
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Common(persona_common::Error::Serialization(err))
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g. acting on a finished session
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Draft failed validation (422)
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Discovery error, mapped by variant
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Discovery(err) => {
                let (status, code) = discovery_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

fn discovery_status(err: &DiscoveryError) -> (StatusCode, &'static str) {
    match err {
        DiscoveryError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        DiscoveryError::UnknownSource(_) => (StatusCode::NOT_FOUND, "UNKNOWN_SOURCE"),
        DiscoveryError::UnknownAction(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_ACTION"),
        DiscoveryError::MalformedAction(_) => (StatusCode::BAD_REQUEST, "MALFORMED_ACTION"),
        DiscoveryError::GenreNotSelected(_) => (StatusCode::BAD_REQUEST, "GENRE_NOT_SELECTED"),
        DiscoveryError::Extraction(_) => (StatusCode::BAD_REQUEST, "EXTRACTION_FAILED"),
        DiscoveryError::SessionFinished(_) => (StatusCode::CONFLICT, "SESSION_FINISHED"),
        DiscoveryError::ValidationFailed(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED")
        }
        DiscoveryError::Generation(_) => (StatusCode::BAD_GATEWAY, "GENERATION_FAILED"),
        DiscoveryError::Common(persona_common::Error::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        DiscoveryError::Common(persona_common::Error::Conflict(_)) => {
            (StatusCode::CONFLICT, "CONFLICT")
        }
        DiscoveryError::Common(persona_common::Error::InvalidInput(_)) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        }
        DiscoveryError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
