//! Video pipeline endpoints: upload, remote download, transcription, and
//! playback. All of them address artifacts by the opaque id the acquisition
//! endpoints hand out; the store's single resolution rule means an unknown id
//! is a 404 from every one of them.

use crate::error::AppError;
use crate::state::AppState;
use crate::transcription::{TranscriptionOrchestrator, TranscriptionResult};
use crate::video::download::content_type_for;
use crate::video::{RemoteVideo, VideoArtifact};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Request body for `POST /process-youtube`. The key matches what the
/// client UI sends.
#[derive(Debug, Deserialize)]
pub struct ProcessYoutubeRequest {
    pub youtube_url: String,
}

/// Query parameters for `POST /transcribe-video`.
#[derive(Debug, Deserialize)]
pub struct TranscribeQuery {
    pub video_id: String,
}

/// `POST /api/v1/upload-video` — multipart upload with a `file` field.
///
/// The declared content type must be `video/*`; anything else is rejected
/// before a byte reaches transient storage.
pub async fn upload_video(
    state: web::Data<AppState>,
    mut payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    use actix_multipart::Field;
    use futures_util::stream::StreamExt;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(item) = payload.next().await {
        let mut field: Field =
            item.map_err(|e| AppError::Validation(format!("Multipart error: {}", e)))?;

        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| AppError::Validation("Missing content disposition".to_string()))?;

        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| AppError::Validation("Missing field name".to_string()))?;

        if field_name == "file" {
            filename = content_disposition.get_filename().map(|s| s.to_string());
            content_type = field.content_type().map(|m| m.to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk =
                    chunk.map_err(|e| AppError::Validation(format!("Chunk error: {}", e)))?;
                bytes.extend_from_slice(&chunk);
            }
            file_bytes = Some(bytes);
        }
    }

    let bytes =
        file_bytes.ok_or_else(|| AppError::Validation("No video file provided".to_string()))?;
    let filename = filename.unwrap_or_else(|| "upload.mp4".to_string());
    let content_type = content_type.unwrap_or_default();

    let artifact = state
        .videos
        .acquire_from_upload(&bytes, &filename, &content_type)?;

    Ok(HttpResponse::Ok().json(upload_response(&artifact, &filename, bytes.len())))
}

/// `POST /api/v1/process-youtube` — download a remote video by URL.
pub async fn process_youtube(
    state: web::Data<AppState>,
    body: web::Json<ProcessYoutubeRequest>,
) -> Result<HttpResponse, AppError> {
    let remote = state.videos.acquire_from_remote(&body.youtube_url).await?;

    Ok(HttpResponse::Ok().json(youtube_response(&remote)))
}

/// Acquisition responses carry both the opaque id and the stored file's
/// name and path; existing clients read all of them.
fn upload_response(artifact: &VideoArtifact, filename: &str, size_bytes: usize) -> serde_json::Value {
    json!({
        "video_id": artifact.id,
        "filename": filename,
        "path": artifact.path.display().to_string(),
        "size_bytes": size_bytes,
        "message": "Video uploaded successfully",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

fn youtube_response(remote: &RemoteVideo) -> serde_json::Value {
    let filename = remote
        .artifact
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    json!({
        "video_id": remote.artifact.id,
        "filename": filename,
        "path": remote.artifact.path.display().to_string(),
        "title": remote.title,
        "duration_seconds": remote.duration_seconds,
        "message": "Video downloaded successfully",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

/// `POST /api/v1/transcribe-video?video_id=` — run the transcription
/// pipeline for a stored artifact and return the transcript plus segments.
pub async fn transcribe_video(
    state: web::Data<AppState>,
    query: web::Query<TranscribeQuery>,
) -> Result<HttpResponse, AppError> {
    let config = &state.config.gemini;
    let orchestrator = TranscriptionOrchestrator::new(
        state.videos.as_ref(),
        state.gemini.as_ref(),
        Duration::from_secs(config.poll_interval_secs),
        config.poll_max_attempts,
    );

    state.increment_active_transcriptions();
    let result = orchestrator.run(&query.video_id).await;
    state.decrement_active_transcriptions();
    let result = result?;

    Ok(HttpResponse::Ok().json(transcribe_response(&query.video_id, &result)))
}

fn transcribe_response(video_id: &str, result: &TranscriptionResult) -> serde_json::Value {
    json!({
        "video_id": video_id,
        "transcript": result.transcript,
        "segments": result.segments,
        "message": "Video transcribed successfully",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
}

/// `GET /api/v1/video-file/{video_id}` — raw media bytes for playback.
pub async fn video_file(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let video_id = path.into_inner();
    let file_path = state.videos.resolve(&video_id)?;
    let bytes = tokio::fs::read(&file_path).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file_path))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::ArtifactOrigin;
    use std::path::PathBuf;

    fn artifact(id: &str, path: &str, origin: ArtifactOrigin) -> VideoArtifact {
        VideoArtifact {
            id: id.to_string(),
            path: PathBuf::from(path),
            origin,
        }
    }

    #[test]
    fn test_process_youtube_request_wire_key() {
        let request: ProcessYoutubeRequest =
            serde_json::from_str(r#"{"youtube_url": "https://youtube.com/watch?v=abc"}"#)
                .unwrap();
        assert_eq!(request.youtube_url, "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn test_upload_response_fields() {
        let artifact = artifact("id-1", "/tmp/videos/id-1.mp4", ArtifactOrigin::Uploaded);
        let body = upload_response(&artifact, "lecture.mp4", 42);

        assert_eq!(body["video_id"], "id-1");
        assert_eq!(body["filename"], "lecture.mp4");
        assert_eq!(body["path"], "/tmp/videos/id-1.mp4");
        assert_eq!(body["size_bytes"], 42);
        assert!(body["message"].is_string());
    }

    #[test]
    fn test_youtube_response_fields() {
        let remote = RemoteVideo {
            artifact: artifact("id-2", "/tmp/videos/id-2.mp4", ArtifactOrigin::Downloaded),
            title: Some("Intro to Cells".to_string()),
            duration_seconds: Some(93.0),
        };
        let body = youtube_response(&remote);

        assert_eq!(body["video_id"], "id-2");
        assert_eq!(body["filename"], "id-2.mp4");
        assert_eq!(body["path"], "/tmp/videos/id-2.mp4");
        assert_eq!(body["title"], "Intro to Cells");
        assert!(body["message"].is_string());
    }

    #[test]
    fn test_transcribe_response_fields() {
        let result = TranscriptionResult {
            transcript: "[00:00] hello".to_string(),
            segments: crate::transcript::parse("[00:00] hello"),
        };
        let body = transcribe_response("id-3", &result);

        assert_eq!(body["video_id"], "id-3");
        assert_eq!(body["transcript"], "[00:00] hello");
        assert_eq!(body["segments"][0]["text"], "hello");
        assert!(body["message"].is_string());
    }
}
