//! # Gemini Client
//!
//! Thin client for the external generative-model service. Two surfaces:
//!
//! - **Text generation** (`generate`): prompt in, text out. Used by every
//!   content transformation endpoint.
//! - **Media jobs** (Files API): upload a video or image, poll the file state
//!   until the service has processed it, generate against a reference to the
//!   uploaded file, and delete the remote resource afterwards. The service
//!   reports `PROCESSING | ACTIVE | FAILED`, which we model as
//!   [`JobState::Processing`] / [`JobState::Ready`] / [`JobState::Failed`].
//!
//! The job-facing surface is exposed through the [`TranscriptionBackend`]
//! trait so the orchestrator's poll loop can be exercised against a scripted
//! fake in tests.

use crate::config::GeminiConfig;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Observed state of an asynchronous media job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Ready,
    Failed,
}

/// Handle to a file uploaded to the model service.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc-123`; used for polling and deletion.
    pub name: String,
    /// URI referenced from generation requests.
    pub uri: String,
    pub mime_type: String,
    pub state: JobState,
}

/// Contract the transcription orchestrator drives.
///
/// The real implementation is [`GeminiClient`]; tests substitute a scripted
/// fake to exercise the poll loop without network access.
pub trait TranscriptionBackend {
    /// Hand media to the service; the returned job may already be ready.
    fn submit(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> impl std::future::Future<Output = AppResult<RemoteFile>> + Send;

    /// Re-query the job state.
    fn poll(&self, file: &RemoteFile) -> impl std::future::Future<Output = AppResult<JobState>> + Send;

    /// Ask the model for text about the uploaded media.
    fn transcribe(
        &self,
        file: &RemoteFile,
        instruction: &str,
    ) -> impl std::future::Future<Output = AppResult<String>> + Send;

    /// Best-effort deletion of the remote resource; never fails the caller.
    fn discard(&self, file: &RemoteFile) -> impl std::future::Future<Output = ()> + Send;
}

// Wire types for generateContent. Only the fields we use.

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Serialize)]
struct FileData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    #[serde(rename = "fileUri")]
    file_uri: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: FileMetadata,
}

#[derive(Deserialize)]
struct FileMetadata {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    #[serde(default)]
    state: String,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            http,
        }
    }

    /// The API key is checked per request so the server can start without
    /// one; the resulting error tells the operator exactly what to set.
    fn require_key(&self) -> AppResult<&str> {
        if self.api_key.is_empty() {
            return Err(AppError::Validation(
                "Gemini API key not configured. Please set GEMINI_API_KEY.".to_string(),
            ));
        }
        Ok(&self.api_key)
    }

    /// Generate text for a prompt.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let parts = vec![Part {
            text: Some(prompt.to_string()),
            file_data: None,
        }];
        self.generate_parts(parts).await
    }

    /// Generate text for a prompt that references an uploaded file.
    pub async fn generate_with_file(&self, prompt: &str, file: &RemoteFile) -> AppResult<String> {
        let parts = vec![
            Part {
                text: None,
                file_data: Some(FileData {
                    mime_type: file.mime_type.clone(),
                    file_uri: file.uri.clone(),
                }),
            },
            Part {
                text: Some(prompt.to_string()),
                file_data: None,
            },
        ];
        self.generate_parts(parts).await
    }

    async fn generate_parts(&self, parts: Vec<Part>) -> AppResult<String> {
        let key = self.require_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            API_BASE, self.model, key
        );
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(upstream)?;

        if !response.status().is_success() {
            return Err(upstream_status("generation", response).await);
        }

        let body: GenerateResponse = response.json().await.map_err(upstream)?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AppError::Upstream(
                "Model returned no text candidates".to_string(),
            ));
        }
        Ok(text)
    }

    /// Upload a local file to the service's file store.
    pub async fn upload_file(&self, path: &Path, mime_type: &str) -> AppResult<RemoteFile> {
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(bytes, mime_type).await
    }

    /// Upload in-memory media (used for images that never touch disk).
    pub async fn upload_bytes(&self, bytes: Vec<u8>, mime_type: &str) -> AppResult<RemoteFile> {
        let key = self.require_key()?;
        let url = format!("{}/upload/v1beta/files?key={}", API_BASE, key);

        debug!(size = bytes.len(), mime_type, "uploading media to model service");

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(upstream)?;

        if !response.status().is_success() {
            return Err(upstream_status("file upload", response).await);
        }

        let envelope: FileEnvelope = response.json().await.map_err(upstream)?;
        Ok(remote_file(envelope.file))
    }

    /// Query the current state of an uploaded file.
    pub async fn file_state(&self, name: &str) -> AppResult<JobState> {
        let key = self.require_key()?;
        let url = format!("{}/v1beta/{}?key={}", API_BASE, name, key);

        let response = self.http.get(&url).send().await.map_err(upstream)?;
        if !response.status().is_success() {
            return Err(upstream_status("file state query", response).await);
        }

        let metadata: FileMetadata = response.json().await.map_err(upstream)?;
        Ok(parse_state(&metadata.state))
    }

    /// Delete an uploaded file. Best-effort: failures are logged only.
    pub async fn delete_file(&self, name: &str) {
        let key = match self.require_key() {
            Ok(key) => key,
            Err(_) => return,
        };
        let url = format!("{}/v1beta/{}?key={}", API_BASE, name, key);

        match self.http.delete(&url).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(file = %name, status = %response.status(), "failed to delete remote file");
            }
            Err(e) => {
                warn!(file = %name, error = %e, "failed to delete remote file");
            }
            Ok(_) => {
                debug!(file = %name, "deleted remote file");
            }
        }
    }
}

impl TranscriptionBackend for GeminiClient {
    async fn submit(&self, path: &Path, mime_type: &str) -> AppResult<RemoteFile> {
        self.upload_file(path, mime_type).await
    }

    async fn poll(&self, file: &RemoteFile) -> AppResult<JobState> {
        self.file_state(&file.name).await
    }

    async fn transcribe(&self, file: &RemoteFile, instruction: &str) -> AppResult<String> {
        self.generate_with_file(instruction, file).await
    }

    async fn discard(&self, file: &RemoteFile) {
        self.delete_file(&file.name).await;
    }
}

fn remote_file(metadata: FileMetadata) -> RemoteFile {
    let state = parse_state(&metadata.state);
    RemoteFile {
        name: metadata.name,
        uri: metadata.uri,
        mime_type: metadata.mime_type,
        state,
    }
}

fn parse_state(state: &str) -> JobState {
    match state {
        "PROCESSING" => JobState::Processing,
        "ACTIVE" => JobState::Ready,
        // FAILED, plus anything the API grows later that we don't know how
        // to wait on.
        _ => JobState::Failed,
    }
}

fn upstream(e: reqwest::Error) -> AppError {
    AppError::Upstream(e.to_string())
}

/// Build an upstream error from a non-success response, preferring the
/// service's own error message when the body is its standard JSON shape.
async fn upstream_status(operation: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let detail = match response.text().await {
        Ok(body) => serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body),
        Err(_) => String::new(),
    };
    AppError::Upstream(format!(
        "Model service {} failed with status {}: {}",
        operation, status, detail
    ))
}
