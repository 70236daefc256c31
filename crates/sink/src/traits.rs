//! Sink trait definition and shared error types.

use kbprep_core::{ConfigError, Submission};

/// Errors that can occur while submitting a chunk.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// What the remote store reported back for an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Identifier assigned by the store, when it returns one.
    pub document_id: Option<String>,
}

/// A destination that durably stores chunks.
///
/// Implementations do not retry; a failed call is reported to the caller.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Store one chunk as a document.
    async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, SinkError>;

    /// Human-readable name for this sink (e.g., "dify").
    fn name(&self) -> &str;
}
