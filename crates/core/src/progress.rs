//! Progress reporting hooks for the prepare and push stages.
//!
//! Pipeline code never logs progress directly; it emits [`ProgressEvent`]s to
//! an [`Observer`]. The binary plugs in [`TracingObserver`], tests plug in
//! recorders.

use std::fmt::Display;
use std::path::Path;

/// Something worth reporting while files are prepared or chunks are pushed.
#[derive(Clone, Copy)]
pub enum ProgressEvent<'a> {
    /// Discovery found no recognized input under `root`.
    NoInput { root: &'a Path },
    /// A source file or artifact is about to be processed.
    FileStarted { path: &'a Path },
    /// A source file or artifact was fully processed.
    FileFinished { path: &'a Path, chunks: u64 },
    /// A source file or artifact was abandoned.
    FileFailed { path: &'a Path, error: &'a dyn Display },
    /// Two inputs in one run map to the same artifact; `artifact` was overwritten.
    ArtifactOverwritten { artifact: &'a Path, source: &'a Path },
    /// One chunk was accepted by the sink.
    ChunkSubmitted { source: &'a str, ordinal: u64 },
    /// One chunk could not be submitted.
    ChunkFailed { source: &'a str, ordinal: u64, error: &'a dyn Display },
}

/// Receives progress events. Implementations must be cheap; they run inline.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &ProgressEvent<'_>);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&self, _event: &ProgressEvent<'_>) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &ProgressEvent<'_>) {
        match *event {
            ProgressEvent::NoInput { root } => {
                tracing::warn!(root = %root.display(), "no input found (supported: csv, txt)");
            }
            ProgressEvent::FileStarted { path } => {
                tracing::info!(path = %path.display(), "processing");
            }
            ProgressEvent::FileFinished { path, chunks } => {
                tracing::info!(path = %path.display(), chunks, "done");
            }
            ProgressEvent::FileFailed { path, error } => {
                tracing::error!(path = %path.display(), error = %error, "failed");
            }
            ProgressEvent::ArtifactOverwritten { artifact, source } => {
                tracing::warn!(
                    artifact = %artifact.display(),
                    source = %source.display(),
                    "artifact name collides with an earlier input in this run; overwriting"
                );
            }
            ProgressEvent::ChunkSubmitted { source, ordinal } => {
                tracing::debug!(source, ordinal, "chunk submitted");
            }
            ProgressEvent::ChunkFailed {
                source,
                ordinal,
                error,
            } => {
                tracing::warn!(source, ordinal, error = %error, "chunk submission failed");
            }
        }
    }
}
