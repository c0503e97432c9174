//! # Video Transcription
//!
//! Drives the external transcription job to completion: resolve the artifact,
//! submit it, poll until the job leaves `Processing`, fetch the transcript,
//! parse it into segments, and reclaim both the local file and the remote
//! resource — exactly once, on every exit path.

pub mod orchestrator;

pub use orchestrator::{TranscriptionOrchestrator, TranscriptionResult};
