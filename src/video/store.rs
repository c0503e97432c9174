//! Transient storage for video artifacts.
//!
//! Uploads and downloads land here under a generated uuid; every later stage
//! (transcription, playback) finds the file again by globbing the directory
//! for that uuid stem, regardless of extension. Deletion is best-effort: a
//! file that cannot be removed is logged and left for the operator, never
//! surfaced to the client.

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactOrigin {
    Uploaded,
    Downloaded,
}

/// A video file held on transient storage, addressed by its generated id.
///
/// The id is the sole handle: there is no in-memory registry, so an artifact
/// exists exactly as long as its file does.
#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub id: String,
    pub path: PathBuf,
    pub origin: ArtifactOrigin,
}

/// Manages acquisition, id-to-path resolution, and deletion of video
/// artifacts in the configured transient directory.
pub struct VideoStore {
    transient_dir: PathBuf,
    pub(crate) max_download_mib: u64,
    pub(crate) cookie_file: Option<PathBuf>,
}

impl VideoStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            transient_dir: PathBuf::from(&config.transient_dir),
            max_download_mib: config.max_download_mib,
            cookie_file: config.cookie_file.as_ref().map(PathBuf::from),
        }
    }

    /// The directory artifacts live in.
    pub fn transient_dir(&self) -> &Path {
        &self.transient_dir
    }

    /// Store an uploaded video on transient storage.
    ///
    /// The declared media type is checked **before** anything touches disk:
    /// a non-video upload is rejected without creating the directory or
    /// writing a single byte. The extension is taken from the declared
    /// filename so playback can serve the right container later.
    pub fn acquire_from_upload(
        &self,
        bytes: &[u8],
        declared_filename: &str,
        content_type: &str,
    ) -> AppResult<VideoArtifact> {
        if !content_type.starts_with("video/") {
            return Err(AppError::Validation(format!(
                "File must be a video, got content type '{}'",
                content_type
            )));
        }

        std::fs::create_dir_all(&self.transient_dir)?;

        let id = Uuid::new_v4().to_string();
        let ext = Path::new(declared_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let path = self.transient_dir.join(format!("{}{}", id, ext));

        std::fs::write(&path, bytes)?;
        info!(id = %id, path = %path.display(), size = bytes.len(), "stored uploaded video");

        Ok(VideoArtifact {
            id,
            path,
            origin: ArtifactOrigin::Uploaded,
        })
    }

    /// Find the unique file whose stem equals `id`, whatever its extension.
    ///
    /// This is the single resolution rule every consumer uses; an id with no
    /// matching file is always the distinct not-found error, no matter how
    /// many unrelated files share the directory.
    pub fn resolve(&self, id: &str) -> AppResult<PathBuf> {
        let entries = match std::fs::read_dir(&self.transient_dir) {
            Ok(entries) => entries,
            // A missing directory just means nothing was ever stored.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("Video not found: {}", id)));
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(id) {
                return Ok(path);
            }
        }

        Err(AppError::NotFound(format!("Video not found: {}", id)))
    }

    /// Delete the artifact for `id`, if it still exists.
    ///
    /// Cleanup is best-effort by contract: every failure is logged and
    /// swallowed so it can never mask the response already computed.
    pub fn remove(&self, id: &str) {
        match self.resolve(id) {
            Ok(path) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(id = %id, path = %path.display(), error = %e, "failed to delete video artifact");
                } else {
                    debug!(id = %id, "deleted video artifact");
                }
            }
            Err(_) => {
                debug!(id = %id, "no artifact to delete");
            }
        }
    }
}
