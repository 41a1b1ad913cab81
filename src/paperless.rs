//! Paperless-NGX client: document ingestion and task-status lookup.
//!
//! Three endpoints are consumed, all authenticated with the static
//! `Authorization: Token <token>` header:
//!
//! * `GET  {base}/api/`                         — connectivity probe
//! * `POST {base}/api/documents/post_document/` — multipart upload
//! * `GET  {base}/api/tasks/?task_id={id}`      — consumption-task status
//!
//! ## The repeated-`tags` quirk
//!
//! Paperless expects one `tags` form field per tag id. A plain key→value map
//! silently keeps only the last tag, so the form is assembled part by part —
//! reqwest's [`multipart::Form`](reqwest::multipart::Form) appends parts and
//! happily carries repeated names.

use crate::error::{ItemError, UploadError};
use chrono::NaiveDate;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// One document submission, constructed per sample and consumed once.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Path to the file to upload (normally a normalised JPEG in the
    /// run-scoped temp directory).
    pub file_path: PathBuf,
    /// Document title, at most 100 characters.
    pub title: String,
    /// Value of the `created` form field.
    pub created: NaiveDate,
    /// Optional Paperless document-type id.
    pub document_type: Option<u32>,
    /// Optional Paperless correspondent id.
    pub correspondent: Option<u32>,
    /// Tag ids, one repeated `tags` form field each.
    pub tag_ids: Vec<u32>,
}

/// One consumption-task record from `GET /api/tasks/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// The opaque identifier returned by the upload endpoint.
    pub task_id: String,
    /// `PENDING`, `STARTED`, `SUCCESS`, or `FAILURE`.
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable outcome once the task has finished.
    #[serde(default)]
    pub result: Option<String>,
    /// Id of the ingested document on success.
    #[serde(default)]
    pub related_document: Option<String>,
}

/// The task listing comes paged (`{"results": […]}`) on older Paperless
/// versions and as a bare array on newer ones. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TasksResponse {
    Paged { results: Vec<TaskStatus> },
    Flat(Vec<TaskStatus>),
}

impl TasksResponse {
    fn into_first(self) -> Option<TaskStatus> {
        match self {
            TasksResponse::Paged { results } => results.into_iter().next(),
            TasksResponse::Flat(tasks) => tasks.into_iter().next(),
        }
    }
}

/// Anything that accepts document submissions.
///
/// [`PaperlessClient`] is the real implementation; tests substitute an
/// in-memory sink so the runner's behaviour is verifiable offline.
#[allow(async_fn_in_trait)]
pub trait DocumentSink {
    /// Lightweight authenticated probe. Never fails hard: connectivity
    /// problems come back as `false` with a logged reason.
    async fn check_connection(&self) -> bool;

    /// Submit one document; returns the destination's task identifier.
    async fn submit(&self, request: &UploadRequest) -> Result<String, ItemError>;
}

/// HTTP client for one Paperless-NGX instance.
pub struct PaperlessClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl PaperlessClient {
    /// Create a client for `base_url` with a fixed per-request timeout.
    ///
    /// Trailing slashes on the URL are trimmed so endpoint paths join
    /// cleanly.
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| UploadError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Token {token}"),
        })
    }

    /// The instance base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET {base}/api/`. True only on a success-class status.
    pub async fn test_connection(&self) -> bool {
        let url = format!("{}/api/", self.base_url);
        match self
            .http
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Connected to Paperless-NGX at {}", self.base_url);
                true
            }
            Ok(response) => {
                warn!(
                    "Paperless-NGX probe failed: HTTP {} from {}",
                    response.status(),
                    url
                );
                false
            }
            Err(e) => {
                warn!("Paperless-NGX probe failed: {e}");
                false
            }
        }
    }

    /// Upload one document via multipart POST.
    ///
    /// On success Paperless returns the consumption-task id as a JSON
    /// string; that id can later be handed to
    /// [`check_task_status`](Self::check_task_status).
    pub async fn upload_document(&self, request: &UploadRequest) -> Result<String, ItemError> {
        let bytes = tokio::fs::read(&request.file_path)
            .await
            .map_err(|e| ItemError::FileRead {
                detail: format!("{}: {e}", request.file_path.display()),
            })?;

        let file_name = request
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.jpg".to_string());

        let document = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type_for(&request.file_path))
            .map_err(|e| ItemError::RequestFailed {
                detail: e.to_string(),
            })?;

        let mut form = multipart::Form::new()
            .part("document", document)
            .text("title", request.title.clone())
            .text("created", request.created.format("%Y-%m-%d").to_string());

        if let Some(dt) = request.document_type {
            form = form.text("document_type", dt.to_string());
        }
        if let Some(c) = request.correspondent {
            form = form.text("correspondent", c.to_string());
        }
        // One part per tag; Paperless rejects comma-joined ids.
        for tag in &request.tag_ids {
            form = form.text("tags", tag.to_string());
        }

        let url = format!("{}/api/documents/post_document/", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.auth_header)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ItemError::RequestFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Upload failed: HTTP {status} — {body}");
            return Err(ItemError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Paperless answers with the bare task UUID as a JSON string.
        let value: serde_json::Value =
            response.json().await.map_err(|e| ItemError::RequestFailed {
                detail: format!("malformed upload response: {e}"),
            })?;
        let task_id = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        debug!("Upload accepted, task {task_id}");
        Ok(task_id)
    }

    /// Look up the consumption task for a submission, single attempt.
    ///
    /// Returns `None` when the task is not (yet) listed or the request
    /// fails; the caller decides whether and when to poll again.
    pub async fn check_task_status(&self, task_id: &str) -> Option<TaskStatus> {
        let url = format!("{}/api/tasks/?task_id={task_id}", self.base_url);
        let response = match self
            .http
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Task status lookup failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Task status lookup failed: HTTP {}", response.status());
            return None;
        }

        match response.json::<TasksResponse>().await {
            Ok(tasks) => tasks.into_first(),
            Err(e) => {
                warn!("Task status lookup returned malformed JSON: {e}");
                None
            }
        }
    }
}

impl DocumentSink for PaperlessClient {
    async fn check_connection(&self) -> bool {
        self.test_connection().await
    }

    async fn submit(&self, request: &UploadRequest) -> Result<String, ItemError> {
        self.upload_document(request).await
    }
}

/// Infer the multipart content type from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("scan.pdf")), "application/pdf");
        assert_eq!(content_type_for(Path::new("sample.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = PaperlessClient::new("http://localhost:8000/", "tok", 30).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn probe_against_unreachable_host_is_false_not_error() {
        // Nothing listens on port 1; the probe must come back false, not panic.
        let client = PaperlessClient::new("http://127.0.0.1:1", "tok", 2).unwrap();
        assert!(!client.test_connection().await);
    }

    #[test]
    fn tasks_response_paged_shape() {
        let json = r#"{"count": 1, "results": [
            {"task_id": "abc-123", "status": "SUCCESS", "result": "Success. New document id 42 created",
             "related_document": "42"}
        ]}"#;
        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let task = parsed.into_first().unwrap();
        assert_eq!(task.task_id, "abc-123");
        assert_eq!(task.status.as_deref(), Some("SUCCESS"));
        assert_eq!(task.related_document.as_deref(), Some("42"));
    }

    #[test]
    fn tasks_response_flat_shape() {
        let json = r#"[{"task_id": "abc-123", "status": "PENDING"}]"#;
        let parsed: TasksResponse = serde_json::from_str(json).unwrap();
        let task = parsed.into_first().unwrap();
        assert_eq!(task.task_id, "abc-123");
        assert!(task.result.is_none());
    }

    #[test]
    fn tasks_response_empty_results() {
        let parsed: TasksResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(parsed.into_first().is_none());
    }
}
