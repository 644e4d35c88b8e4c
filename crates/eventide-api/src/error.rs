//! Eventide — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventide_core::error::DomainError;
use eventide_runtime::RuntimeError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration or content failed to load.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Content could not be installed into the runtime.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// An error from the runtime or a domain handler.
    Runtime(RuntimeError),
    /// The request clashes with something already in progress.
    Conflict(String),
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Runtime(RuntimeError::Domain(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            Self::Runtime(err) => {
                let (status, code) = match &err {
                    RuntimeError::EventNotFound(_) | RuntimeError::CutsceneNotFound(_) => {
                        (StatusCode::NOT_FOUND, "not_found")
                    }
                    RuntimeError::NoActivePage(_) => (StatusCode::CONFLICT, "no_active_page"),
                    RuntimeError::Domain(DomainError::NotFound(_)) => {
                        (StatusCode::NOT_FOUND, "not_found")
                    }
                    RuntimeError::Domain(DomainError::Validation(_)) => {
                        (StatusCode::BAD_REQUEST, "validation_error")
                    }
                    RuntimeError::Domain(DomainError::Infrastructure(_)) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                    }
                };
                (status, code, err.to_string())
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
