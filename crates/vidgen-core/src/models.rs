//! Task bookkeeping models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider task status, mirrored verbatim from the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Bookkeeping record for one outstanding provider task.
///
/// A record exists in the task index for every outstanding task id; absence
/// means the task is unknown or already finalized. When an upscale job is
/// chained, a second record is written under the upscale task's id with
/// `original_task_id` still pointing at the first submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Object-store key the finished video will be written to.
    pub destination_key: String,
    /// Base URL the finished video is publicly retrievable under.
    pub public_base_url: String,
    /// Whether the client asked for a 4K upscale pass.
    pub upscale_requested: bool,
    /// Task id of the first (pre-upscale) submission in this chain.
    pub original_task_id: String,
}

impl TaskRecord {
    /// Final public URL of the stored asset.
    pub fn public_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.destination_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let status: TaskStatus = serde_json::from_str("\"SUCCEEDED\"").unwrap();
        assert_eq!(status, TaskStatus::Succeeded);
        assert_eq!(serde_json::to_string(&TaskStatus::Running).unwrap(), "\"RUNNING\"");
        assert_eq!(TaskStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Succeeded.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_record_round_trip() {
        let record = TaskRecord {
            destination_key: "videos/171-cat.mp4".to_string(),
            public_base_url: "https://cdn".to_string(),
            upscale_requested: false,
            original_task_id: "t1".to_string(),
        };
        let json = serde_json::to_vec(&record).unwrap();
        let back: TaskRecord = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.public_url(), "https://cdn/videos/171-cat.mp4");
    }
}
