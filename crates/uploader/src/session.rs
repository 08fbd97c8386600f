//! Per-upload lifecycle state machine.
//!
//! All state changes flow through [`UploadSession::apply`], one transition
//! function over explicit [`SessionEvent`]s, so the lifecycle is testable
//! without any transport or rendering surface. Events that are invalid in
//! the current state are discarded without effect — notably stale
//! `ProcessingComplete` events from earlier uploads.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Upload lifecycle states.
///
/// `Assembling` means every byte has been transferred but the server-side
/// pipeline has not yet confirmed completion — it must be rendered
/// distinctly from `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    Transferring,
    Assembling,
    Completed,
    Failed,
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new file was selected; resets the session.
    FileSelected {
        filename: String,
        total_size: u64,
        total_chunks: u64,
    },
    /// The chunked transfer sequence is starting.
    TransferStarted,
    /// A single whole-file request succeeded.
    WholeUploadSucceeded { document_id: String },
    /// Chunk `index` was acknowledged by the server.
    ChunkSucceeded { index: u64, document_id: String },
    /// A transfer call failed; the sequence stops here.
    TransferFailed { error: String },
    /// The notification channel reported pipeline completion.
    ProcessingComplete { document_id: String },
}

#[derive(Debug)]
struct SessionInner {
    filename: String,
    total_size: u64,
    total_chunks: u64,
    completed_chunks: u64,
    document_id: Option<String>,
    state: UploadState,
    progress: u8,
    error: Option<String>,
    assembling_since: Option<Instant>,
}

impl SessionInner {
    fn reset(&mut self, filename: String, total_size: u64, total_chunks: u64) {
        *self = SessionInner {
            filename,
            total_size,
            total_chunks,
            completed_chunks: 0,
            document_id: None,
            state: UploadState::Idle,
            progress: 0,
            error: None,
            assembling_since: None,
        };
    }
}

/// One file transfer attempt (thread-safe).
pub struct UploadSession {
    inner: RwLock<SessionInner>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    /// Creates an idle session with no file selected.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                filename: String::new(),
                total_size: 0,
                total_chunks: 0,
                completed_chunks: 0,
                document_id: None,
                state: UploadState::Idle,
                progress: 0,
                error: None,
                assembling_since: None,
            }),
        }
    }

    /// Applies one event and returns the resulting state.
    ///
    /// Invalid events for the current state leave the session untouched.
    pub fn apply(&self, event: SessionEvent) -> UploadState {
        let mut s = self.inner.write().unwrap();
        match event {
            SessionEvent::FileSelected {
                filename,
                total_size,
                total_chunks,
            } => {
                // Selecting mid-transfer is rejected upstream; ignore here.
                if !matches!(s.state, UploadState::Transferring | UploadState::Assembling) {
                    s.reset(filename, total_size, total_chunks);
                }
            }

            SessionEvent::TransferStarted => {
                if s.state == UploadState::Idle && s.total_chunks > 0 {
                    s.state = UploadState::Transferring;
                }
            }

            SessionEvent::WholeUploadSucceeded { document_id } => {
                if s.state == UploadState::Idle {
                    s.document_id = Some(document_id);
                    s.completed_chunks = s.total_chunks;
                    s.progress = 100;
                    s.state = UploadState::Completed;
                }
            }

            SessionEvent::ChunkSucceeded { index, document_id } => {
                if s.state == UploadState::Transferring {
                    if s.document_id.is_none() {
                        s.document_id = Some(document_id);
                    }
                    s.completed_chunks = index + 1;
                    // Ceiling keeps progress non-zero from the first chunk
                    // and exactly 100 only on the last.
                    s.progress = (s.completed_chunks * 100).div_ceil(s.total_chunks) as u8;
                    if s.completed_chunks == s.total_chunks {
                        s.state = UploadState::Assembling;
                        s.assembling_since = Some(Instant::now());
                    }
                }
            }

            SessionEvent::TransferFailed { error } => {
                if matches!(s.state, UploadState::Idle | UploadState::Transferring) {
                    s.error = Some(error);
                    s.state = UploadState::Failed;
                }
            }

            SessionEvent::ProcessingComplete { document_id } => {
                if s.state == UploadState::Assembling
                    && s.document_id.as_deref() == Some(document_id.as_str())
                {
                    s.state = UploadState::Completed;
                    s.assembling_since = None;
                }
            }
        }
        s.state
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UploadState {
        self.inner.read().unwrap().state
    }

    /// Progress in percent (0-100).
    pub fn progress(&self) -> u8 {
        self.inner.read().unwrap().progress
    }

    /// Server-assigned document id, once known.
    pub fn document_id(&self) -> Option<String> {
        self.inner.read().unwrap().document_id.clone()
    }

    /// Original filename of the selected file.
    pub fn filename(&self) -> String {
        self.inner.read().unwrap().filename.clone()
    }

    /// Total file size in bytes.
    pub fn total_size(&self) -> u64 {
        self.inner.read().unwrap().total_size
    }

    /// Total chunk count for the selected file.
    pub fn total_chunks(&self) -> u64 {
        self.inner.read().unwrap().total_chunks
    }

    /// Chunks acknowledged so far.
    pub fn completed_chunks(&self) -> u64 {
        self.inner.read().unwrap().completed_chunks
    }

    /// Error message for a failed session.
    pub fn error(&self) -> Option<String> {
        self.inner.read().unwrap().error.clone()
    }

    /// Returns `true` once the session has sat in `Assembling` longer than
    /// `bound` with no completion event — the detectable stuck condition
    /// left behind when the notification channel is lost.
    pub fn is_stuck(&self, bound: Duration) -> bool {
        let s = self.inner.read().unwrap();
        s.state == UploadState::Assembling
            && s.assembling_since.is_some_and(|t| t.elapsed() > bound)
    }
}
