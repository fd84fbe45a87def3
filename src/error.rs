//! Error handling module
//!
//! HTTP-layer error type and conversion of engine results into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{ResponseStatus, WalletError, WalletResponse};

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    // Engine errors
    #[error(transparent)]
    Wallet(#[from] WalletError),

    // Server errors (5xx)
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            AppError::MissingHeader(_) => StatusCode::UNAUTHORIZED,
            AppError::Wallet(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::MissingHeader(_) => "missing_header",
            AppError::InvalidHeader(_) => "invalid_header",
            AppError::Wallet(err) => err.error_code(),
            AppError::Config(_) => "config_error",
        }
    }
}

/// Failure envelope: `{status: "failed", code, message, errorCode}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub code: u16,
    pub message: String,
    pub error_code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Never leak internals to the caller
        let message = match &self {
            AppError::Wallet(WalletError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Wallet(WalletError::StorageUnavailable(msg)) => {
                tracing::warn!("Storage unavailable: {}", msg);
                "Service temporarily unavailable, please retry".to_string()
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            status: ResponseStatus::Failed,
            code: status.as_u16(),
            message,
            error_code: self.error_code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> IntoResponse for WalletResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
