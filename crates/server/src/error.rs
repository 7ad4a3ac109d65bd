use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dositio::store::StoreError;
use dositio::{ErrorKind, GuardError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Guard(err) => err.status(),
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Store(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::Guard(err) => err.code(),
            ServerError::NotFound => ErrorKind::NotFound.code(),
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ServerError::Store(_) | ServerError::Internal(_) => ErrorKind::Internal.code(),
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Client-facing message. Failures below the HTTP layer never leak detail.
    fn public_message(&self) -> String {
        match self {
            ServerError::Guard(err) => err.message().to_string(),
            ServerError::NotFound => ErrorKind::NotFound.message().to_string(),
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::PayloadTooLarge => "Request body exceeds the configured limit".to_string(),
            ServerError::Store(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                ErrorKind::Internal.message().to_string()
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
                status: status.as_u16(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ErrorKind> for ServerError {
    fn from(kind: ErrorKind) -> Self {
        ServerError::Guard(GuardError::new(kind))
    }
}

impl From<JsonRejection> for ServerError {
    fn from(err: JsonRejection) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ServerError::PayloadTooLarge;
        }
        ServerError::BadRequest(err.body_text())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
