//! Generation provider client
//!
//! Wraps the external video-generation HTTP API: job submission, status
//! polling, upscale-job submission, and artifact download. The provider owns
//! all the heavy lifting; this client only mirrors its task state.

mod http;

pub use http::HttpProvider;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use vidgen_core::TaskStatus;

/// Provider operation errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Parameters for an image-to-video generation job.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub image_url: String,
    pub prompt: String,
    pub duration_secs: u32,
    pub aspect_ratio: String,
    /// Per-submission random seed, uniform over the full u32 range.
    pub seed: u32,
}

/// Snapshot of a provider-side task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTask {
    pub id: String,
    pub status: TaskStatus,
    /// Completion percentage as reported by the provider.
    pub progress: u8,
    /// Output artifact URL, present once the task has succeeded.
    pub output_url: Option<String>,
    /// Provider-side failure reason, present once the task has failed.
    pub failure_reason: Option<String>,
    /// For chained jobs (upscale), the task id this one was derived from.
    pub origin_task_id: Option<String>,
}

/// External generation provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit an image-to-video generation job.
    async fn submit_generation(&self, job: &GenerationJob) -> ProviderResult<ProviderTask>;

    /// Submit an upscale job derived from a succeeded generation task.
    async fn submit_upscale(&self, task_id: &str) -> ProviderResult<ProviderTask>;

    /// Fetch the current state of a task.
    async fn get_task(&self, task_id: &str) -> ProviderResult<ProviderTask>;

    /// Download a finished artifact.
    async fn fetch_output(&self, url: &str) -> ProviderResult<Bytes>;
}
