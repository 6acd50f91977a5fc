//! Core types shared across the vidgen workspace: configuration, the unified
//! error type, task models, and storage key derivation.

pub mod config;
pub mod error;
pub mod keys;
pub mod models;

pub use config::Config;
pub use error::{AppError, LogLevel};
pub use models::{TaskRecord, TaskStatus};
