use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One task snapshot as reported by the server. Mirrors the `/api/generate`
/// response body for both submissions and status polls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReply {
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("VIDGEN_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:4000".to_string());

        Self::new(base_url)
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Submit an image plus prompt as a multipart generation request.
    pub async fn submit(
        &self,
        image_path: &Path,
        prompt: &str,
        duration: Option<u32>,
        ratio: Option<&str>,
        upscale: bool,
    ) -> Result<TaskReply> {
        let image = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("Failed to read {}", image_path.display()))?;
        let filename = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        let mut form = multipart::Form::new()
            .text("prompt", prompt.to_string())
            .part("image", multipart::Part::bytes(image).file_name(filename));
        if let Some(duration) = duration {
            form = form.text("duration", duration.to_string());
        }
        if let Some(ratio) = ratio {
            form = form.text("ratio", ratio.to_string());
        }
        if upscale {
            form = form.text("upscale", "true");
        }

        let response = self
            .client
            .post(self.generate_url())
            .multipart(form)
            .send()
            .await
            .context("Failed to reach the API")?;

        Self::parse_reply(response).await
    }

    /// Poll a task's status.
    pub async fn status(&self, task_id: &str) -> Result<TaskReply> {
        let response = self
            .client
            .post(self.generate_url())
            .json(&serde_json::json!({ "taskId": task_id, "action": "status" }))
            .send()
            .await
            .context("Failed to reach the API")?;

        Self::parse_reply(response).await
    }

    async fn parse_reply(response: reqwest::Response) -> Result<TaskReply> {
        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorReply>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        serde_json::from_str(&body).context("Unexpected response body")
    }
}
