//! Generation task lifecycle.
//!
//! Owns the full orchestration workflow: store the uploaded image, submit
//! the generation job, mirror provider status to the client, chain the 4K
//! upscale job when requested, and on success copy the finished video into
//! object storage before handing the client its public URL.
//!
//! The provider keeps the authoritative task state; the index only maps a
//! task id back to the destination chosen at submission time. Record
//! cleanup after finalize is at-least-once and runs off the request path.

use bytes::Bytes;
use std::sync::Arc;
use vidgen_core::{keys, AppError, TaskRecord, TaskStatus};
use vidgen_index::TaskIndex;
use vidgen_provider::{GenerationJob, GenerationProvider};
use vidgen_storage::Storage;

/// Synthetic status reported while a chained upscale job is outstanding.
/// The provider never emits it; clients poll through it like any other
/// non-terminal status.
pub const STATUS_UPSCALING: &str = "UPSCALING";
const UPSCALING_PROGRESS: u8 = 50;

/// Generation parameters applied when the client omits the field.
#[derive(Clone)]
pub struct GenerationDefaults {
    pub duration_secs: u32,
    pub aspect_ratio: String,
}

/// A validated submission, decoupled from the HTTP form it arrived in.
pub struct SubmitRequest {
    pub prompt: String,
    pub image_filename: String,
    pub image_bytes: Bytes,
    pub image_content_type: String,
    pub duration_secs: Option<u32>,
    pub aspect_ratio: Option<String>,
    pub upscale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: u8,
}

/// What a status poll tells the client. `status` is a plain string because
/// it carries the synthetic [`STATUS_UPSCALING`] in addition to provider
/// statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub task_id: String,
    pub status: String,
    pub progress: u8,
    pub video_url: Option<String>,
}

pub struct TaskTracker {
    storage: Arc<dyn Storage>,
    index: Arc<dyn TaskIndex>,
    provider: Arc<dyn GenerationProvider>,
    defaults: GenerationDefaults,
}

impl TaskTracker {
    pub fn new(
        storage: Arc<dyn Storage>,
        index: Arc<dyn TaskIndex>,
        provider: Arc<dyn GenerationProvider>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            storage,
            index,
            provider,
            defaults,
        }
    }

    /// Store the source image, submit the generation job, and record where
    /// the finished video will go. The destination key is fixed here and
    /// never recomputed.
    pub async fn submit(&self, req: SubmitRequest) -> Result<SubmitOutcome, AppError> {
        let prompt = req.prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Missing prompt.".to_string()));
        }
        if req.image_bytes.is_empty() {
            return Err(AppError::Validation("Missing image file.".to_string()));
        }

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let upload_key = keys::upload_key(timestamp_ms, &req.image_filename);

        let image_url = self
            .storage
            .put(&upload_key, req.image_bytes, &req.image_content_type)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let destination_key = keys::destination_key(timestamp_ms, &req.image_filename, req.upscale);
        let destination_url = self.storage.public_url(&destination_key);
        let public_base_url = destination_url
            .strip_suffix(&destination_key)
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(destination_url);

        let job = GenerationJob {
            image_url,
            prompt: prompt.to_string(),
            duration_secs: req.duration_secs.unwrap_or(self.defaults.duration_secs),
            aspect_ratio: req
                .aspect_ratio
                .unwrap_or_else(|| self.defaults.aspect_ratio.clone()),
            seed: rand::random(),
        };

        let task = self
            .provider
            .submit_generation(&job)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let record = TaskRecord {
            destination_key: destination_key.clone(),
            public_base_url,
            upscale_requested: req.upscale,
            original_task_id: task.id.clone(),
        };
        self.index
            .put(&task.id, &record)
            .await
            .map_err(|e| AppError::Index(e.to_string()))?;

        tracing::info!(
            task_id = %task.id,
            destination_key = %destination_key,
            upscale = req.upscale,
            "Generation task submitted"
        );

        Ok(SubmitOutcome {
            task_id: task.id,
            status: task.status,
            progress: task.progress,
        })
    }

    /// Poll a task and advance the workflow when it reaches a terminal
    /// state. Non-terminal provider statuses pass through verbatim.
    pub async fn poll(&self, task_id: &str) -> Result<PollOutcome, AppError> {
        let task = self
            .provider
            .get_task(task_id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !task.status.is_terminal() {
            return Ok(PollOutcome {
                task_id: task.id,
                status: task.status.to_string(),
                progress: task.progress,
                video_url: None,
            });
        }

        if task.status == TaskStatus::Failed {
            let reason = task
                .failure_reason
                .unwrap_or_else(|| "Generation failed upstream.".to_string());
            return Err(AppError::Upstream(reason));
        }

        // SUCCEEDED. Find the record written at submission; upscale tasks
        // may only be indexed under their origin id if the poll that
        // submitted the upscale lost a race with cleanup.
        let record = self.lookup_record(&task.id, task.origin_task_id.as_deref()).await?;

        if record.upscale_requested && task.id == record.original_task_id {
            return self.chain_upscale(&task.id, record).await;
        }

        self.finalize(&task.id, &record, task.output_url.as_deref())
            .await
    }

    async fn lookup_record(
        &self,
        task_id: &str,
        origin_task_id: Option<&str>,
    ) -> Result<TaskRecord, AppError> {
        if let Some(record) = self
            .index
            .get(task_id)
            .await
            .map_err(|e| AppError::Index(e.to_string()))?
        {
            return Ok(record);
        }

        if let Some(origin) = origin_task_id {
            if let Some(record) = self
                .index
                .get(origin)
                .await
                .map_err(|e| AppError::Index(e.to_string()))?
            {
                return Ok(record);
            }
        }

        Err(AppError::State(format!(
            "No record found for task {}",
            task_id
        )))
    }

    async fn chain_upscale(
        &self,
        task_id: &str,
        record: TaskRecord,
    ) -> Result<PollOutcome, AppError> {
        let upscale_task = self
            .provider
            .submit_upscale(task_id)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        // The new record keeps pointing at the original submission so the
        // finalize pass can clean up the whole chain.
        self.index
            .put(&upscale_task.id, &record)
            .await
            .map_err(|e| AppError::Index(e.to_string()))?;

        tracing::info!(
            task_id = %upscale_task.id,
            original_task_id = %task_id,
            "Upscale task chained"
        );

        Ok(PollOutcome {
            task_id: upscale_task.id,
            status: STATUS_UPSCALING.to_string(),
            progress: UPSCALING_PROGRESS,
            video_url: None,
        })
    }

    async fn finalize(
        &self,
        task_id: &str,
        record: &TaskRecord,
        output_url: Option<&str>,
    ) -> Result<PollOutcome, AppError> {
        let output_url = output_url.ok_or_else(|| {
            AppError::State(format!("Task {} succeeded without an output URL", task_id))
        })?;

        let video = self
            .provider
            .fetch_output(output_url)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let video_bytes = video.len();

        let video_url = self
            .storage
            .put(&record.destination_key, video, "video/mp4")
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::info!(
            task_id = %task_id,
            destination_key = %record.destination_key,
            video_bytes,
            "Generation task finalized"
        );

        // Record cleanup is off the request path; a crash here only leaves
        // a stale record behind, never a missing video.
        let index = self.index.clone();
        let mut stale_ids = vec![task_id.to_string()];
        if record.original_task_id != task_id {
            stale_ids.push(record.original_task_id.clone());
        }
        tokio::spawn(async move {
            for id in stale_ids {
                if let Err(e) = index.remove(&id).await {
                    tracing::warn!(error = %e, task_id = %id, "Task record cleanup failed");
                }
            }
        });

        Ok(PollOutcome {
            task_id: task_id.to_string(),
            status: TaskStatus::Succeeded.to_string(),
            progress: 100,
            video_url: Some(video_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vidgen_index::MemoryIndex;
    use vidgen_provider::{ProviderError, ProviderResult, ProviderTask};
    use vidgen_storage::MemoryStorage;

    /// Scripted provider double. `get_task` serves from a fixed task map;
    /// submissions return pre-canned tasks and log what was asked.
    #[derive(Default)]
    struct MockProvider {
        submit_reply: Option<ProviderTask>,
        upscale_reply: Option<ProviderTask>,
        tasks: HashMap<String, ProviderTask>,
        outputs: HashMap<String, Bytes>,
        submitted_jobs: Mutex<Vec<GenerationJob>>,
        upscaled_ids: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationProvider for MockProvider {
        async fn submit_generation(&self, job: &GenerationJob) -> ProviderResult<ProviderTask> {
            self.submitted_jobs.lock().unwrap().push(job.clone());
            self.submit_reply
                .clone()
                .ok_or_else(|| ProviderError::Request("no scripted submit reply".to_string()))
        }

        async fn submit_upscale(&self, task_id: &str) -> ProviderResult<ProviderTask> {
            self.upscaled_ids.lock().unwrap().push(task_id.to_string());
            self.upscale_reply
                .clone()
                .ok_or_else(|| ProviderError::Request("no scripted upscale reply".to_string()))
        }

        async fn get_task(&self, task_id: &str) -> ProviderResult<ProviderTask> {
            self.tasks.get(task_id).cloned().ok_or_else(|| {
                ProviderError::Upstream {
                    status: 404,
                    message: format!("unknown task {}", task_id),
                }
            })
        }

        async fn fetch_output(&self, url: &str) -> ProviderResult<Bytes> {
            self.outputs
                .get(url)
                .cloned()
                .ok_or_else(|| ProviderError::Request(format!("unknown output {}", url)))
        }
    }

    fn pending_task(id: &str) -> ProviderTask {
        ProviderTask {
            id: id.to_string(),
            status: TaskStatus::Pending,
            progress: 0,
            output_url: None,
            failure_reason: None,
            origin_task_id: None,
        }
    }

    fn defaults() -> GenerationDefaults {
        GenerationDefaults {
            duration_secs: 5,
            aspect_ratio: "1280:768".to_string(),
        }
    }

    struct Harness {
        tracker: TaskTracker,
        storage: Arc<MemoryStorage>,
        index: Arc<MemoryIndex>,
        provider: Arc<MockProvider>,
    }

    fn harness(provider: MockProvider) -> Harness {
        let storage = Arc::new(MemoryStorage::new("https://cdn"));
        let index = Arc::new(MemoryIndex::new());
        let provider = Arc::new(provider);
        let tracker = TaskTracker::new(
            storage.clone(),
            index.clone(),
            provider.clone(),
            defaults(),
        );
        Harness {
            tracker,
            storage,
            index,
            provider,
        }
    }

    fn submit_request(upscale: bool) -> SubmitRequest {
        SubmitRequest {
            prompt: "a cat surfing".to_string(),
            image_filename: "cat.jpg".to_string(),
            image_bytes: Bytes::from_static(b"jpeg bytes"),
            image_content_type: "image/jpeg".to_string(),
            duration_secs: None,
            aspect_ratio: None,
            upscale,
        }
    }

    /// Drive fire-and-forget cleanup tasks to completion on the
    /// current-thread test runtime.
    async fn drain_spawned_tasks() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_submit_stores_image_and_records_task() {
        let h = harness(MockProvider {
            submit_reply: Some(pending_task("gen-1")),
            ..Default::default()
        });

        let outcome = h.tracker.submit(submit_request(false)).await.unwrap();
        assert_eq!(outcome.task_id, "gen-1");
        assert_eq!(outcome.status, TaskStatus::Pending);
        assert_eq!(outcome.progress, 0);

        // Source image uploaded, and the job pointed at its URL.
        assert_eq!(h.storage.object_count(), 1);
        let jobs = h.provider.submitted_jobs.lock().unwrap();
        assert!(jobs[0].image_url.starts_with("https://cdn/uploads/"));
        assert!(jobs[0].image_url.ends_with("-cat.jpg"));
        assert_eq!(jobs[0].prompt, "a cat surfing");
        assert_eq!(jobs[0].duration_secs, 5);
        assert_eq!(jobs[0].aspect_ratio, "1280:768");

        // Record keyed by the provider task id and pointing at itself.
        let record = h.index.get("gen-1").await.unwrap().unwrap();
        assert!(record.destination_key.starts_with("videos/"));
        assert!(record.destination_key.ends_with("-cat.mp4"));
        assert!(!record.upscale_requested);
        assert_eq!(record.original_task_id, "gen-1");
        assert_eq!(record.public_base_url, "https://cdn");
    }

    #[tokio::test]
    async fn test_submit_upscale_flag_marks_destination() {
        let h = harness(MockProvider {
            submit_reply: Some(pending_task("gen-1")),
            ..Default::default()
        });

        h.tracker.submit(submit_request(true)).await.unwrap();
        let record = h.index.get("gen-1").await.unwrap().unwrap();
        assert!(record.upscale_requested);
        assert!(record.destination_key.ends_with("-cat-4k.mp4"));
    }

    #[tokio::test]
    async fn test_submit_without_prompt_is_rejected_before_any_io() {
        let h = harness(MockProvider::default());

        let mut req = submit_request(false);
        req.prompt = "   ".to_string();
        let err = h.tracker.submit(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.storage.object_count(), 0);
        assert!(h.index.is_empty().await);
    }

    #[tokio::test]
    async fn test_submit_without_image_is_rejected() {
        let h = harness(MockProvider::default());

        let mut req = submit_request(false);
        req.image_bytes = Bytes::new();
        let err = h.tracker.submit(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_poll_passes_non_terminal_status_through() {
        let mut provider = MockProvider::default();
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Running,
                progress: 37,
                ..pending_task("gen-1")
            },
        );
        let h = harness(provider);

        // No record needed while the task is still running.
        let outcome = h.tracker.poll("gen-1").await.unwrap();
        assert_eq!(outcome.status, "RUNNING");
        assert_eq!(outcome.progress, 37);
        assert_eq!(outcome.video_url, None);
    }

    #[tokio::test]
    async fn test_poll_failed_task_surfaces_provider_reason() {
        let mut provider = MockProvider::default();
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Failed,
                failure_reason: Some("NSFW content detected".to_string()),
                ..pending_task("gen-1")
            },
        );
        let h = harness(provider);

        let err = h.tracker.poll("gen-1").await.unwrap_err();
        match err {
            AppError::Upstream(msg) => assert_eq!(msg, "NSFW content detected"),
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_succeeded_finalizes_and_cleans_up() {
        let mut provider = MockProvider {
            submit_reply: Some(pending_task("gen-1")),
            ..Default::default()
        };
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/out.mp4".to_string()),
                ..pending_task("gen-1")
            },
        );
        provider.outputs.insert(
            "https://provider/out.mp4".to_string(),
            Bytes::from_static(b"mp4 bytes"),
        );
        let h = harness(provider);

        h.tracker.submit(submit_request(false)).await.unwrap();
        let record = h.index.get("gen-1").await.unwrap().unwrap();

        let outcome = h.tracker.poll("gen-1").await.unwrap();
        assert_eq!(outcome.status, "SUCCEEDED");
        assert_eq!(outcome.progress, 100);
        assert_eq!(
            outcome.video_url.as_deref(),
            Some(record.public_url().as_str())
        );

        // Video stored at the destination fixed at submission time.
        assert_eq!(
            h.storage.content_type_of(&record.destination_key).as_deref(),
            Some("video/mp4")
        );

        drain_spawned_tasks().await;
        assert!(h.index.is_empty().await);
    }

    #[tokio::test]
    async fn test_poll_succeeded_without_record_is_a_state_error() {
        let mut provider = MockProvider::default();
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/out.mp4".to_string()),
                ..pending_task("gen-1")
            },
        );
        let h = harness(provider);

        let err = h.tracker.poll("gen-1").await.unwrap_err();
        assert!(matches!(err, AppError::State(_)));
    }

    #[tokio::test]
    async fn test_poll_chains_upscale_when_requested() {
        let mut provider = MockProvider {
            submit_reply: Some(pending_task("gen-1")),
            upscale_reply: Some(pending_task("up-1")),
            ..Default::default()
        };
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/out.mp4".to_string()),
                ..pending_task("gen-1")
            },
        );
        let h = harness(provider);

        h.tracker.submit(submit_request(true)).await.unwrap();
        let outcome = h.tracker.poll("gen-1").await.unwrap();

        // The client keeps polling with the upscale task's id.
        assert_eq!(outcome.task_id, "up-1");
        assert_eq!(outcome.status, STATUS_UPSCALING);
        assert_eq!(outcome.progress, 50);
        assert_eq!(outcome.video_url, None);
        assert_eq!(
            h.provider.upscaled_ids.lock().unwrap().as_slice(),
            ["gen-1"]
        );

        // Upscale record still points at the original submission.
        let record = h.index.get("up-1").await.unwrap().unwrap();
        assert_eq!(record.original_task_id, "gen-1");
        assert!(record.upscale_requested);
    }

    #[tokio::test]
    async fn test_poll_finalizes_upscale_task_and_cleans_whole_chain() {
        let mut provider = MockProvider {
            submit_reply: Some(pending_task("gen-1")),
            upscale_reply: Some(pending_task("up-1")),
            ..Default::default()
        };
        provider.tasks.insert(
            "gen-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/gen.mp4".to_string()),
                ..pending_task("gen-1")
            },
        );
        provider.tasks.insert(
            "up-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/4k.mp4".to_string()),
                origin_task_id: Some("gen-1".to_string()),
                ..pending_task("up-1")
            },
        );
        provider.outputs.insert(
            "https://provider/4k.mp4".to_string(),
            Bytes::from_static(b"4k mp4 bytes"),
        );
        let h = harness(provider);

        h.tracker.submit(submit_request(true)).await.unwrap();
        h.tracker.poll("gen-1").await.unwrap(); // chains up-1

        let outcome = h.tracker.poll("up-1").await.unwrap();
        assert_eq!(outcome.status, "SUCCEEDED");
        let url = outcome.video_url.unwrap();
        assert!(url.ends_with("-cat-4k.mp4"), "unexpected url {}", url);

        drain_spawned_tasks().await;
        // Both the upscale record and the original are gone.
        assert!(h.index.is_empty().await);
    }

    #[tokio::test]
    async fn test_poll_upscale_task_falls_back_to_origin_record() {
        // Upscale record lost (e.g. process restart between polls); the
        // origin id reported by the provider still resolves the chain.
        let mut provider = MockProvider::default();
        provider.tasks.insert(
            "up-1".to_string(),
            ProviderTask {
                status: TaskStatus::Succeeded,
                progress: 100,
                output_url: Some("https://provider/4k.mp4".to_string()),
                origin_task_id: Some("gen-1".to_string()),
                ..pending_task("up-1")
            },
        );
        provider.outputs.insert(
            "https://provider/4k.mp4".to_string(),
            Bytes::from_static(b"4k"),
        );
        let h = harness(provider);

        let record = TaskRecord {
            destination_key: "videos/171-cat-4k.mp4".to_string(),
            public_base_url: "https://cdn".to_string(),
            upscale_requested: true,
            original_task_id: "gen-1".to_string(),
        };
        h.index.put("gen-1", &record).await.unwrap();

        let outcome = h.tracker.poll("up-1").await.unwrap();
        assert_eq!(
            outcome.video_url.as_deref(),
            Some("https://cdn/videos/171-cat-4k.mp4")
        );

        drain_spawned_tasks().await;
        assert!(h.index.is_empty().await);
    }
}
