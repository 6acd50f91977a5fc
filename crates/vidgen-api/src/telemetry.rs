//! Logging initialization.
//!
//! JSON output in production, compact human-readable output everywhere
//! else. `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;
use vidgen_core::Config;

pub fn init_telemetry(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
