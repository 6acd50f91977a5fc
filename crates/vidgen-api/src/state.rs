//! Application state shared across handlers.

use std::sync::Arc;

use crate::tracker::TaskTracker;
use vidgen_core::Config;

/// Shared application state. The tracker owns the storage, index, and
/// provider clients, so cloning the state per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tracker: Arc<TaskTracker>,
}

impl AppState {
    pub fn new(config: Config, tracker: Arc<TaskTracker>) -> Self {
        Self { config, tracker }
    }
}

// Handlers run on the multi-threaded runtime; state must cross threads.
fn _assert_send_sync<T: Send + Sync>() {}
#[allow(dead_code)]
fn _assertions() {
    _assert_send_sync::<AppState>();
}
