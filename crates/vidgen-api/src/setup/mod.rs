//! Application setup and initialization
//!
//! All wiring lives here rather than in main.rs: storage, the task index,
//! the provider client, and the router.

pub mod routes;
pub mod server;

use crate::state::AppState;
use crate::tracker::{GenerationDefaults, TaskTracker};
use anyhow::{Context, Result};
use std::sync::Arc;
use vidgen_core::Config;
use vidgen_index::RedbIndex;
use vidgen_provider::HttpProvider;
use vidgen_storage::S3Storage;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<axum::Router> {
    config.validate().context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let storage = S3Storage::new(
        config.s3_bucket().to_string(),
        config.s3_region().to_string(),
        config.s3_endpoint().map(str::to_string),
        config.public_base_url().map(str::to_string),
    )
    .await
    .context("Failed to initialize object storage")?;

    let index = RedbIndex::open(config.task_index_path())
        .context("Failed to open task index")?;

    let provider = HttpProvider::new(
        config.provider_api_base().to_string(),
        config.provider_api_key().to_string(),
        config.provider_timeout_secs(),
    )
    .context("Failed to initialize provider client")?;

    let tracker = TaskTracker::new(
        Arc::new(storage),
        Arc::new(index),
        Arc::new(provider),
        GenerationDefaults {
            duration_secs: config.default_duration_secs(),
            aspect_ratio: config.default_aspect_ratio().to_string(),
        },
    );

    let state = AppState::new(config.clone(), Arc::new(tracker));
    let router = routes::setup_routes(&config, state)?;

    Ok(router)
}
