mod error;
mod handlers;
mod setup;
mod state;
mod telemetry;
mod tracker;

use vidgen_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    telemetry::init_telemetry(&config);

    // Initialize the application (storage, index, provider, routes)
    let router = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
