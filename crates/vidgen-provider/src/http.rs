//! HTTP implementation of the generation provider client.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vidgen_core::TaskStatus;

use crate::{GenerationJob, GenerationProvider, ProviderError, ProviderResult, ProviderTask};

#[derive(Clone)]
pub struct HttpProvider {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SubmitGenerationRequest<'a> {
    image_url: &'a str,
    text_prompt: &'a str,
    duration: u32,
    ratio: &'a str,
    seed: u32,
}

#[derive(Debug, Serialize)]
struct SubmitUpscaleRequest<'a> {
    task_id: &'a str,
}

/// Wire form of a provider task.
#[derive(Debug, Deserialize)]
struct TaskEnvelope {
    id: String,
    status: TaskStatus,
    /// Completion ratio in `0.0..=1.0`.
    progress: Option<f32>,
    /// Output artifact URLs; the first entry is the finished video.
    output: Option<Vec<String>>,
    failure: Option<String>,
    origin_task_id: Option<String>,
}

impl From<TaskEnvelope> for ProviderTask {
    fn from(env: TaskEnvelope) -> Self {
        ProviderTask {
            id: env.id,
            status: env.status,
            progress: env
                .progress
                .map(|p| (p.clamp(0.0, 1.0) * 100.0).round() as u8)
                .unwrap_or(0),
            output_url: env.output.and_then(|mut urls| {
                if urls.is_empty() {
                    None
                } else {
                    Some(urls.remove(0))
                }
            }),
            failure_reason: env.failure,
            origin_task_id: env.origin_task_id,
        }
    }
}

impl HttpProvider {
    pub fn new(api_base: String, api_key: String, timeout_secs: u64) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn parse_task(&self, response: reqwest::Response) -> ProviderResult<ProviderTask> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status, message });
        }

        let envelope: TaskEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(envelope.into())
    }

    async fn post_task<B: Serialize>(&self, path: &str, body: &B) -> ProviderResult<ProviderTask> {
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        self.parse_task(response).await
    }
}

#[async_trait]
impl GenerationProvider for HttpProvider {
    async fn submit_generation(&self, job: &GenerationJob) -> ProviderResult<ProviderTask> {
        let body = SubmitGenerationRequest {
            image_url: &job.image_url,
            text_prompt: &job.prompt,
            duration: job.duration_secs,
            ratio: &job.aspect_ratio,
            seed: job.seed,
        };

        let task = self.post_task("/v1/image_to_video", &body).await?;
        tracing::info!(task_id = %task.id, status = %task.status, "Generation job submitted");
        Ok(task)
    }

    async fn submit_upscale(&self, task_id: &str) -> ProviderResult<ProviderTask> {
        let body = SubmitUpscaleRequest { task_id };

        let task = self.post_task("/v1/upscale", &body).await?;
        tracing::info!(
            task_id = %task.id,
            origin_task_id = %task_id,
            "Upscale job submitted"
        );
        Ok(task)
    }

    async fn get_task(&self, task_id: &str) -> ProviderResult<ProviderTask> {
        let response = self
            .client
            .get(self.url(&format!("/v1/tasks/{}", task_id)))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        self.parse_task(response).await
    }

    async fn fetch_output(&self, url: &str) -> ProviderResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Upstream {
                status: response.status().as_u16(),
                message: format!("Failed to download output from {}", url),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))
    }
}
