//! Error types module
//!
//! The `AppError` enum unifies the error kinds the orchestration workflow can
//! surface: client validation failures, generation-provider failures, task
//! index inconsistencies, and object-storage failures.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable inconsistencies
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Task index error: {0}")]
    Index(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl AppError {
    /// Get the error type name for structured logging
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Upstream(_) => "Upstream",
            AppError::State(_) => "State",
            AppError::Storage(_) => "Storage",
            AppError::Index(_) => "Index",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Log level for this error. Validation failures are expected client
    /// behavior; upstream rejections are provider-side; the rest indicate
    /// something wrong on our side.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_) => LogLevel::Debug,
            AppError::Upstream(_) => LogLevel::Warn,
            AppError::State(_) => LogLevel::Warn,
            AppError::Storage(_) | AppError::Index(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }

    /// Client-facing message. Every kind carries its message through
    /// verbatim; callers surface them uniformly.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Upstream(msg)
            | AppError::State(msg)
            | AppError::Storage(msg)
            | AppError::Index(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}
