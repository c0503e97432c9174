//! The per-request transcription state machine.
//!
//! Stages run strictly in order: Resolve → Submit → Poll → Fetch → Parse →
//! Cleanup → Respond. The poll sleep is the only suspension point; it blocks
//! this one request while other requests proceed independently. Once the
//! artifact has been resolved, cleanup runs no matter how the pipeline ends,
//! and a cleanup failure can only ever produce a log line — never replace the
//! result already computed.

use crate::error::{AppError, AppResult};
use crate::gemini::{JobState, RemoteFile, TranscriptionBackend};
use crate::transcript::{self, TranscriptSegment};
use crate::video::download::content_type_for;
use crate::video::VideoStore;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed instruction sent once the media job is ready.
const TRANSCRIBE_INSTRUCTION: &str = "Transcribe this video completely. \
    Begin each paragraph with a timestamp in square brackets in [MM:SS] format \
    marking where that part of the video starts, and start a new paragraph \
    whenever the topic changes.";

/// What the transcribe endpoint returns: the raw transcript plus its parsed
/// segment list, in original order.
#[derive(Debug, Serialize)]
pub struct TranscriptionResult {
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Runs the transcription pipeline for one request.
pub struct TranscriptionOrchestrator<'a, B: TranscriptionBackend> {
    store: &'a VideoStore,
    backend: &'a B,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl<'a, B: TranscriptionBackend> TranscriptionOrchestrator<'a, B> {
    pub fn new(
        store: &'a VideoStore,
        backend: &'a B,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            store,
            backend,
            poll_interval,
            max_poll_attempts,
        }
    }

    /// Transcribe the artifact identified by `video_id`.
    ///
    /// An id that resolves to no file aborts with the not-found error before
    /// anything else runs. After resolution, the local artifact and any
    /// remote file are released exactly once whether the pipeline succeeds
    /// or fails.
    pub async fn run(&self, video_id: &str) -> AppResult<TranscriptionResult> {
        let path = self.store.resolve(video_id)?;

        let mut remote: Option<RemoteFile> = None;
        let result = self.pipeline(&path, &mut remote).await;

        // Cleanup: best-effort on every exit path past Resolve. Failures are
        // logged inside remove/discard and never surface here.
        if let Some(file) = &remote {
            self.backend.discard(file).await;
        }
        self.store.remove(video_id);

        if let Err(e) = &result {
            warn!(video_id = %video_id, error = %e, "transcription pipeline failed");
        }
        result
    }

    async fn pipeline(
        &self,
        path: &Path,
        remote: &mut Option<RemoteFile>,
    ) -> AppResult<TranscriptionResult> {
        let mime_type = content_type_for(path);

        let file = self.backend.submit(path, mime_type).await?;
        let mut state = file.state;
        *remote = Some(file.clone());
        debug!(file = %file.name, ?state, "media submitted for transcription");

        let mut attempts = 0u32;
        while state == JobState::Processing {
            if attempts >= self.max_poll_attempts {
                return Err(AppError::Upstream(format!(
                    "Transcription job did not finish within {} polls ({}s); giving up",
                    self.max_poll_attempts,
                    self.max_poll_attempts as u64 * self.poll_interval.as_secs(),
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
            attempts += 1;
            state = self.backend.poll(&file).await?;
        }

        if state == JobState::Failed {
            return Err(AppError::Upstream(format!(
                "Transcription job failed for uploaded media {}",
                file.name
            )));
        }

        let transcript = self.backend.transcribe(&file, TRANSCRIBE_INSTRUCTION).await?;
        let segments = transcript::parse(&transcript);
        info!(
            file = %file.name,
            polls = attempts,
            segments = segments.len(),
            "transcription complete"
        );

        Ok(TranscriptionResult {
            transcript,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted backend: a fixed initial state, then a queue of poll states.
    struct FakeBackend {
        initial_state: JobState,
        poll_states: Mutex<Vec<JobState>>,
        transcript: String,
        submit_calls: AtomicU32,
        poll_calls: AtomicU32,
        discarded: AtomicBool,
    }

    impl FakeBackend {
        fn new(initial_state: JobState, poll_states: Vec<JobState>, transcript: &str) -> Self {
            Self {
                initial_state,
                poll_states: Mutex::new(poll_states),
                transcript: transcript.to_string(),
                submit_calls: AtomicU32::new(0),
                poll_calls: AtomicU32::new(0),
                discarded: AtomicBool::new(false),
            }
        }
    }

    impl TranscriptionBackend for FakeBackend {
        async fn submit(&self, _path: &Path, mime_type: &str) -> AppResult<RemoteFile> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteFile {
                name: "files/test".to_string(),
                uri: "https://files.example/test".to_string(),
                mime_type: mime_type.to_string(),
                state: self.initial_state,
            })
        }

        async fn poll(&self, _file: &RemoteFile) -> AppResult<JobState> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            let mut states = self.poll_states.lock().unwrap();
            if states.is_empty() {
                Ok(JobState::Processing)
            } else {
                Ok(states.remove(0))
            }
        }

        async fn transcribe(&self, _file: &RemoteFile, instruction: &str) -> AppResult<String> {
            assert!(instruction.contains("[MM:SS]"));
            Ok(self.transcript.clone())
        }

        async fn discard(&self, _file: &RemoteFile) {
            self.discarded.store(true, Ordering::SeqCst);
        }
    }

    fn store_with_video(dir: &tempfile::TempDir) -> (VideoStore, String) {
        let store = VideoStore::new(&StorageConfig {
            transient_dir: dir.path().to_string_lossy().into_owned(),
            max_download_mib: 100,
            cookie_file: None,
        });
        let artifact = store
            .acquire_from_upload(b"video bytes", "clip.mp4", "video/mp4")
            .unwrap();
        (store, artifact.id)
    }

    fn orchestrator<'a>(
        store: &'a VideoStore,
        backend: &'a FakeBackend,
    ) -> TranscriptionOrchestrator<'a, FakeBackend> {
        TranscriptionOrchestrator::new(store, backend, Duration::from_millis(1), 5)
    }

    #[tokio::test]
    async fn test_immediately_ready_job_skips_polling() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = store_with_video(&dir);
        let backend = FakeBackend::new(JobState::Ready, vec![], "[00:00] Hi there");

        let result = orchestrator(&store, &backend).run(&id).await.unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_polls_until_ready_then_parses() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = store_with_video(&dir);
        let backend = FakeBackend::new(
            JobState::Processing,
            vec![JobState::Processing, JobState::Ready],
            "[00:00] Hello world\n[00:30] more text\nand continuing",
        );

        let result = orchestrator(&store, &backend).run(&id).await.unwrap();
        assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].timestamp, "00:00");
        assert_eq!(result.segments[0].text, "Hello world");
        assert_eq!(result.segments[1].text, "more text and continuing");
        // Raw transcript is returned untouched alongside the segments.
        assert!(result.transcript.starts_with("[00:00] Hello world"));
    }

    #[tokio::test]
    async fn test_cleanup_runs_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = store_with_video(&dir);
        let backend = FakeBackend::new(JobState::Ready, vec![], "[00:00] text");

        orchestrator(&store, &backend).run(&id).await.unwrap();
        assert!(backend.discarded.load(Ordering::SeqCst));
        assert!(matches!(store.resolve(&id), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cleanup_runs_on_job_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = store_with_video(&dir);
        let backend = FakeBackend::new(JobState::Processing, vec![JobState::Failed], "");

        let err = orchestrator(&store, &backend).run(&id).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        // Both the remote resource and the local artifact were released.
        assert!(backend.discarded.load(Ordering::SeqCst));
        assert!(matches!(store.resolve(&id), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_poll_budget_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let (store, id) = store_with_video(&dir);
        // Never leaves Processing.
        let backend = FakeBackend::new(JobState::Processing, vec![], "");

        let err = orchestrator(&store, &backend).run(&id).await.unwrap_err();
        match err {
            AppError::Upstream(msg) => assert!(msg.contains("did not finish")),
            other => panic!("expected Upstream timeout, got {other:?}"),
        }
        assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 5);
        assert!(backend.discarded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unknown_id_aborts_before_submit() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _id) = store_with_video(&dir);
        let backend = FakeBackend::new(JobState::Ready, vec![], "");

        let err = orchestrator(&store, &backend)
            .run("no-such-id")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 0);
        assert!(!backend.discarded.load(Ordering::SeqCst));
    }
}
