//! Remote video acquisition via yt-dlp.
//!
//! The downloader is an external collaborator: we hand it a URL plus format
//! and size constraints, and it gives us back a single mp4 on transient
//! storage along with title/duration metadata from a separate probe. A cookie
//! file can be attached for sites that demand sign-in; a failure whose output
//! points at authentication is classified as client-actionable so the caller
//! learns how to supply credentials instead of seeing a generic 500.

use crate::error::{AppError, AppResult};
use crate::video::{ArtifactOrigin, VideoArtifact, VideoStore};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// A downloaded artifact plus the metadata the probe reported.
#[derive(Debug)]
pub struct RemoteVideo {
    pub artifact: VideoArtifact,
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct ProbeInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// Phrases in yt-dlp output that mean the site wants the viewer signed in.
const AUTH_FAILURE_PHRASES: &[&str] = &[
    "sign in",
    "log in",
    "login required",
    "authentication",
    "cookies",
    "private video",
    "members-only",
];

/// Reject anything that is not an http(s) URL before it reaches a subprocess.
fn validate_url(url: &str) -> AppResult<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid URL (must start with http:// or https://): {}",
            trimmed
        )))
    }
}

/// Classify a download failure by its output text.
///
/// Sign-in style failures become a 400 with remediation guidance; everything
/// else surfaces as an upstream failure preserving the original message.
fn classify_failure(output: &str) -> AppError {
    let lowered = output.to_lowercase();
    if AUTH_FAILURE_PHRASES.iter().any(|p| lowered.contains(p)) {
        AppError::UpstreamAuth(
            "This video requires sign-in to download. Export your browser cookies for the site \
             and point the server at them via YTDLP_COOKIE_FILE (or storage.cookie_file in \
             config.toml), then retry."
                .to_string(),
        )
    } else {
        // Cap the surfaced detail so a huge stderr dump doesn't end up in a
        // JSON error payload.
        let truncated: String = output.chars().take(1000).collect();
        AppError::Upstream(format!("Video download failed: {}", truncated))
    }
}

impl VideoStore {
    /// Download a remote video to transient storage.
    ///
    /// Prefers a single-file mp4 with both video and audio, capped at the
    /// configured size. Metadata comes from a `--dump-json` probe that never
    /// downloads anything; probe failures only cost us the title.
    pub async fn acquire_from_remote(&self, url: &str) -> AppResult<RemoteVideo> {
        validate_url(url)?;

        std::fs::create_dir_all(self.transient_dir())?;

        let id = Uuid::new_v4().to_string();
        let output_path = self.transient_dir().join(format!("{}.mp4", id));

        info!(%url, id = %id, "downloading remote video");

        let cookie_args = self.cookie_arguments();

        // Metadata probe first; a failing probe is not fatal.
        let mut probe = tokio::process::Command::new("yt-dlp");
        probe
            .args(["--dump-json", "--no-download", "--no-playlist", "--no-exec"])
            .args(&cookie_args)
            .arg(url);
        let probe_output = probe.output().await.map_err(downloader_missing)?;
        let info: Option<ProbeInfo> = if probe_output.status.success() {
            serde_json::from_slice(&probe_output.stdout).ok()
        } else {
            None
        };

        let max_filesize = format!("{}M", self.max_download_mib);
        let format_selector = format!(
            "best[ext=mp4][filesize<{0}M]/best[filesize<{0}M]/best",
            self.max_download_mib
        );

        let mut download = tokio::process::Command::new("yt-dlp");
        download
            .args(["-f", &format_selector])
            .args(["--max-filesize", &max_filesize])
            .args(["--no-playlist", "--no-exec"])
            .args(&cookie_args)
            .arg("--output")
            .arg(&output_path)
            .arg(url);
        let output = download.output().await.map_err(downloader_missing)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        // yt-dlp exits 0 but skips the file when it exceeds --max-filesize.
        if !output_path.exists() {
            return Err(AppError::Upstream(format!(
                "Download produced no file (video may exceed the {} MiB limit)",
                self.max_download_mib
            )));
        }

        info!(id = %id, path = %output_path.display(), "remote video downloaded");

        Ok(RemoteVideo {
            artifact: VideoArtifact {
                id,
                path: output_path,
                origin: ArtifactOrigin::Downloaded,
            },
            title: info.as_ref().and_then(|i| i.title.clone()),
            duration_seconds: info.as_ref().and_then(|i| i.duration),
        })
    }

    /// `--cookies <file>` when a cookie file is configured and present.
    ///
    /// A configured-but-missing file is downgraded to a warning: the download
    /// still runs without credentials rather than failing outright.
    fn cookie_arguments(&self) -> Vec<String> {
        match &self.cookie_file {
            Some(path) if path.exists() => {
                vec!["--cookies".to_string(), path.to_string_lossy().into_owned()]
            }
            Some(path) => {
                warn!(
                    cookie_file = %path.display(),
                    "configured cookie file does not exist, downloading without credentials"
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

fn downloader_missing(e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::Upstream("yt-dlp not found — install with: pip install yt-dlp".to_string())
    } else {
        AppError::Internal(e.to_string())
    }
}

/// Serve-time MIME guess from the artifact's extension, for playback.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    #[test]
    fn test_sign_in_failure_is_client_actionable() {
        let err = classify_failure("ERROR: Sign in to confirm you're not a bot");
        match err {
            AppError::UpstreamAuth(msg) => {
                assert!(msg.contains("YTDLP_COOKIE_FILE"), "missing remediation: {msg}");
            }
            other => panic!("expected UpstreamAuth, got {other:?}"),
        }
    }

    #[test]
    fn test_cookie_phrase_is_client_actionable() {
        assert!(matches!(
            classify_failure("ERROR: cookies are required for this site"),
            AppError::UpstreamAuth(_)
        ));
    }

    #[test]
    fn test_other_failures_stay_server_class() {
        let err = classify_failure("ERROR: HTTP Error 503: Service Unavailable");
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("503")),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_stderr_is_truncated() {
        let noise = "x".repeat(10_000);
        if let AppError::Upstream(msg) = classify_failure(&noise) {
            assert!(msg.len() < 1100);
        } else {
            panic!("expected Upstream");
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(validate_url("https://example.com/v/1").is_ok());
        assert!(validate_url("  http://example.com ").is_ok());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("example.com/v/1").is_err());
    }

    #[test]
    fn test_missing_cookie_file_yields_no_args() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::new(&StorageConfig {
            transient_dir: dir.path().to_string_lossy().into_owned(),
            max_download_mib: 100,
            cookie_file: Some(dir.path().join("absent.txt").to_string_lossy().into_owned()),
        });
        assert!(store.cookie_arguments().is_empty());
    }

    #[test]
    fn test_present_cookie_file_is_attached() {
        let dir = tempfile::tempdir().unwrap();
        let cookie_path = dir.path().join("cookies.txt");
        std::fs::write(&cookie_path, "# Netscape HTTP Cookie File\n").unwrap();

        let store = VideoStore::new(&StorageConfig {
            transient_dir: dir.path().to_string_lossy().into_owned(),
            max_download_mib: 100,
            cookie_file: Some(cookie_path.to_string_lossy().into_owned()),
        });
        let args = store.cookie_arguments();
        assert_eq!(args[0], "--cookies");
        assert!(args[1].ends_with("cookies.txt"));
    }

    #[test]
    fn test_content_type_guessing() {
        assert_eq!(content_type_for(Path::new("a.webm")), "video/webm");
        assert_eq!(content_type_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("noext")), "video/mp4");
    }
}
