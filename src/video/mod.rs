//! # Video Artifact Handling
//!
//! Acquisition, lookup, and cleanup of video files on transient storage.
//! The filesystem itself is the registry: an artifact exists exactly when a
//! file whose stem equals its id is present in the transient directory, and
//! the uuid ids make collisions between concurrent acquisitions impossible.

pub mod download;
pub mod store;

pub use download::RemoteVideo;
pub use store::{ArtifactOrigin, VideoArtifact, VideoStore};
