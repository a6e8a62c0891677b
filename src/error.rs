//! Error types shared across the gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Every failure the gateway can raise while serving a request
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or unusable process configuration (e.g. no API credential)
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    /// Upstream answered with an error code
    #[error("{0}")]
    Upstream(String),

    /// Upstream answered without the fields its contract promises
    #[error("{0}")]
    MalformedResponse(String),

    #[error("{0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) | AppError::Settings(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::Upstream(_) | AppError::HttpClient(_) => "upstream",
            AppError::MalformedResponse(_) | AppError::Serialization(_) => "malformed_response",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }

    /// Attach the endpoint's failure title before turning into a response
    pub fn titled(self, title: &'static str) -> ErrorReply {
        ErrorReply { title, error: self }
    }
}

/// An error paired with the user-visible title of the endpoint that raised it
#[derive(Debug)]
pub struct ErrorReply {
    pub title: &'static str,
    pub error: AppError,
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = match &self.error {
            AppError::Validation(message) | AppError::NotFound(message) => {
                json!({ "error": message })
            }
            other => json!({ "error": self.title, "detail": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.titled("Request failed").into_response()
    }
}
