//! Configuration module
//!
//! Environment-driven configuration for the API server, the generation
//! provider client, object storage, and the task index.

use std::env;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DURATION_SECS: u32 = 5;
const DEFAULT_ASPECT_RATIO: &str = "1280:768";
const DEFAULT_TASK_INDEX_PATH: &str = "./db/task_index.redb";
const DEFAULT_MAX_BODY_SIZE_MB: usize = 64;

/// Base configuration shared by the server surfaces
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub base: BaseConfig,
    // Generation provider
    pub provider_api_base: String,
    pub provider_api_key: String,
    pub provider_timeout_secs: u64,
    // Object storage
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    /// Overrides the derived public URL base for stored assets when set.
    pub public_base_url: Option<String>,
    // Task index
    pub task_index_path: String,
    // Generation defaults applied when the client omits the field
    pub default_duration_secs: u32,
    pub default_aspect_ratio: String,
    // Request body ceiling for the multipart endpoint. Per-file limits are
    // enforced client-side; this only bounds the whole request.
    pub max_body_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<OrchestratorConfig>);

impl Config {
    fn inner(&self) -> &OrchestratorConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = OrchestratorConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn provider_api_base(&self) -> &str {
        &self.inner().provider_api_base
    }

    pub fn provider_api_key(&self) -> &str {
        &self.inner().provider_api_key
    }

    pub fn provider_timeout_secs(&self) -> u64 {
        self.inner().provider_timeout_secs
    }

    pub fn s3_bucket(&self) -> &str {
        &self.inner().s3_bucket
    }

    pub fn s3_region(&self) -> &str {
        &self.inner().s3_region
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.inner().public_base_url.as_deref()
    }

    pub fn task_index_path(&self) -> &str {
        &self.inner().task_index_path
    }

    pub fn default_duration_secs(&self) -> u32 {
        self.inner().default_duration_secs
    }

    pub fn default_aspect_ratio(&self) -> &str {
        &self.inner().default_aspect_ratio
    }

    pub fn max_body_bytes(&self) -> usize {
        self.inner().max_body_bytes
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
        };

        let config = OrchestratorConfig {
            base,
            provider_api_base: env::var("PROVIDER_API_BASE")
                .map_err(|_| anyhow::anyhow!("PROVIDER_API_BASE must be set"))?,
            provider_api_key: env::var("PROVIDER_API_KEY")
                .map_err(|_| anyhow::anyhow!("PROVIDER_API_KEY must be set"))?,
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
            s3_bucket: env::var("S3_BUCKET")
                .map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?,
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .map_err(|_| anyhow::anyhow!("S3_REGION or AWS_REGION must be set"))?,
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
            task_index_path: env::var("TASK_INDEX_PATH")
                .unwrap_or_else(|_| DEFAULT_TASK_INDEX_PATH.to_string()),
            default_duration_secs: env::var("DEFAULT_DURATION_SECS")
                .unwrap_or_else(|_| DEFAULT_DURATION_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DURATION_SECS),
            default_aspect_ratio: env::var("DEFAULT_ASPECT_RATIO")
                .unwrap_or_else(|_| DEFAULT_ASPECT_RATIO.to_string()),
            max_body_bytes: env::var("MAX_BODY_SIZE_MB")
                .unwrap_or_else(|_| DEFAULT_MAX_BODY_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(DEFAULT_MAX_BODY_SIZE_MB)
                * 1024
                * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.provider_api_base.starts_with("http://")
            && !self.provider_api_base.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "PROVIDER_API_BASE must be an http(s) URL"
            ));
        }

        if self.provider_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("PROVIDER_API_KEY cannot be empty"));
        }

        if self.s3_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET cannot be empty"));
        }

        if self.default_duration_secs == 0 {
            return Err(anyhow::anyhow!(
                "DEFAULT_DURATION_SECS must be greater than zero"
            ));
        }

        Ok(())
    }
}
