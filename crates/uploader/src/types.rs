//! Coordinator configuration, identifiers, and lifecycle events.

use std::fmt;
use std::time::Duration;

use docport_chunker::DEFAULT_CHUNK_SIZE;

use crate::session::UploadState;

/// Correlation key binding the notification channel to uploads.
///
/// Generated once per presentation session and shared read-only by every
/// upload issued within it; never reused across unrelated sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Generates a fresh session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coordinator configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Chunk size in bytes; files at or below this go up in one request.
    pub chunk_size: u64,
    /// How long a session may sit in `Assembling` before it is reported
    /// as stuck. `None` disables stuck detection.
    pub stuck_after: Option<Duration>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            stuck_after: Some(Duration::from_secs(120)),
        }
    }
}

/// Lifecycle event emitted to the presentation layer.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The session moved to a new state.
    StateChanged { state: UploadState },
    /// Chunk progress update.
    Progress {
        percent: u8,
        completed_chunks: u64,
        total_chunks: u64,
    },
    /// Server-side processing finished; the document is queryable.
    Completed { document_id: String },
    /// The upload failed with a human-readable message.
    Failed { error: String },
}
