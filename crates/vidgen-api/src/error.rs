//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`.
//! Use `AppError` (or types that implement `Into<AppError>`) for errors and
//! `.map_err(Into::into)` so they become `HttpAppError` and render consistently
//! (status, body, logging).

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use vidgen_core::{AppError, LogLevel};
use vidgen_index::IndexError;
use vidgen_provider::ProviderError;
use vidgen_storage::StorageError;

/// Error body shape the browser client matches on: `success` is always
/// `false` and `error` carries the display message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from vidgen-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::Storage(err.to_string()))
    }
}

impl From<IndexError> for HttpAppError {
    fn from(err: IndexError) -> Self {
        HttpAppError(AppError::Index(err.to_string()))
    }
}

impl From<ProviderError> for HttpAppError {
    fn from(err: ProviderError) -> Self {
        HttpAppError(AppError::Upstream(err.to_string()))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        HttpAppError(AppError::Validation(format!(
            "Invalid multipart body: {}",
            err.body_text()
        )))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        log_error(app_error);

        // The browser client keys off the body's `success` flag and treats
        // every failure the same way, so all errors render as 500.
        let body = Json(ErrorResponse {
            success: false,
            error: app_error.client_message(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error() {
        let storage_err = StorageError::UploadFailed("timed out".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Storage(msg) => assert!(msg.contains("timed out")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_provider_error_is_upstream() {
        let provider_err = ProviderError::Upstream {
            status: 429,
            message: "rate limited".to_string(),
        };
        let HttpAppError(app_err) = provider_err.into();
        match app_err {
            AppError::Upstream(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("rate limited"));
            }
            _ => panic!("Expected Upstream variant"),
        }
    }

    #[test]
    fn test_from_index_error() {
        let index_err = IndexError::Backend("db locked".to_string());
        let HttpAppError(app_err) = index_err.into();
        match app_err {
            AppError::Index(msg) => assert!(msg.contains("db locked")),
            _ => panic!("Expected Index variant"),
        }
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            success: false,
            error: "Missing prompt".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("success"), Some(&serde_json::Value::Bool(false)));
        assert_eq!(
            json.get("error").and_then(|v| v.as_str()),
            Some("Missing prompt")
        );
    }
}
