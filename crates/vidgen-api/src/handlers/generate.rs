//! The `/api/generate` endpoint.
//!
//! One route serves both halves of the browser workflow, multiplexed on the
//! request content type: `multipart/form-data` submits a new generation,
//! `application/json` polls an outstanding task. Anything else is rejected.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::tracker::SubmitRequest;
use vidgen_core::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Submit,
    Poll,
}

/// Response body for both submit and poll. `videoUrl` only appears once
/// the finished video has been stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub success: bool,
    pub task_id: String,
    pub status: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRequest {
    task_id: String,
    #[serde(default)]
    action: Option<String>,
}

fn classify_content_type(content_type: Option<&str>) -> Option<RequestKind> {
    let mime = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "multipart/form-data" => Some(RequestKind::Submit),
        "application/json" => Some(RequestKind::Poll),
        _ => None,
    }
}

pub async fn generate(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<TaskResponse>, HttpAppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match classify_content_type(content_type.as_deref()) {
        Some(RequestKind::Submit) => submit(state, req).await,
        Some(RequestKind::Poll) => poll(state, req).await,
        None => Err(AppError::Validation("Invalid request content-type.".to_string()).into()),
    }
}

async fn submit(state: AppState, req: Request) -> Result<Json<TaskResponse>, HttpAppError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e.body_text())))?;

    let mut prompt = String::new();
    let mut image: Option<(String, String, bytes::Bytes)> = None;
    let mut duration_secs = None;
    let mut aspect_ratio = None;
    let mut upscale = false;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "prompt" => prompt = field.text().await?,
            "image" => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                image = Some((filename, content_type, data));
            }
            "duration" => duration_secs = field.text().await?.trim().parse::<u32>().ok(),
            "ratio" => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() {
                    aspect_ratio = Some(value.to_string());
                }
            }
            "upscale" => {
                let value = field.text().await?;
                upscale = matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "on" | "yes"
                );
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let (image_filename, image_content_type, image_bytes) =
        image.ok_or_else(|| AppError::Validation("Missing image file.".to_string()))?;

    let outcome = state
        .tracker
        .submit(SubmitRequest {
            prompt,
            image_filename,
            image_bytes,
            image_content_type,
            duration_secs,
            aspect_ratio,
            upscale,
        })
        .await?;

    Ok(Json(TaskResponse {
        success: true,
        task_id: outcome.task_id,
        status: outcome.status.to_string(),
        progress: outcome.progress,
        video_url: None,
    }))
}

async fn poll(state: AppState, req: Request) -> Result<Json<TaskResponse>, HttpAppError> {
    let Json(body) = Json::<StatusRequest>::from_request(req, &())
        .await
        .map_err(|rej| AppError::Validation(format!("Invalid request body: {}", rej.body_text())))?;

    if let Some(action) = body.action.as_deref() {
        if action != "status" {
            return Err(
                AppError::Validation(format!("Unknown action '{}'.", action)).into(),
            );
        }
    }

    let outcome = state.tracker.poll(&body.task_id).await?;

    Ok(Json(TaskResponse {
        success: true,
        task_id: outcome.task_id,
        status: outcome.status,
        progress: outcome.progress,
        video_url: outcome.video_url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_multipart_with_boundary_parameter() {
        assert_eq!(
            classify_content_type(Some("multipart/form-data; boundary=----x")),
            Some(RequestKind::Submit)
        );
    }

    #[test]
    fn test_classify_json_with_charset() {
        assert_eq!(
            classify_content_type(Some("application/json; charset=utf-8")),
            Some(RequestKind::Poll)
        );
        assert_eq!(
            classify_content_type(Some("APPLICATION/JSON")),
            Some(RequestKind::Poll)
        );
    }

    #[test]
    fn test_classify_rejects_everything_else() {
        assert_eq!(classify_content_type(Some("text/plain")), None);
        assert_eq!(classify_content_type(None), None);
    }

    #[test]
    fn test_response_wire_shape() {
        let response = TaskResponse {
            success: true,
            task_id: "gen-1".to_string(),
            status: "RUNNING".to_string(),
            progress: 37,
            video_url: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["taskId"], "gen-1");
        assert_eq!(json["progress"], 37);
        assert!(json.get("videoUrl").is_none());

        let done = TaskResponse {
            video_url: Some("https://cdn/videos/171-cat.mp4".to_string()),
            ..response
        };
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["videoUrl"], "https://cdn/videos/171-cat.mp4");
    }

    #[test]
    fn test_status_request_accepts_camel_case_task_id() {
        let body: StatusRequest =
            serde_json::from_str(r#"{"taskId":"gen-1","action":"status"}"#).unwrap();
        assert_eq!(body.task_id, "gen-1");
        assert_eq!(body.action.as_deref(), Some("status"));
    }
}
