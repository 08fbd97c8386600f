//! Upload coordinator — drives one file transfer end to end.
//!
//! Chunks are issued strictly sequentially: chunk `i + 1` is never sent
//! before chunk `i`'s response is observed. That trades upload speed for
//! order-deterministic server-side assembly and monotonic progress.
//! Reaching `Assembling` is as far as the coordinator can go on its own;
//! the [`crate::correlator::SessionCorrelator`] finishes the lifecycle
//! when the matching completion event arrives.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docport_api::NEW_DOCUMENT;
use docport_chunker::ChunkReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::UploadError;
use crate::session::{SessionEvent, UploadSession, UploadState};
use crate::transfer::{ChunkRequest, TransferClient};
use crate::types::{ClientId, UploadConfig, UploadEvent};

/// Buffered lifecycle events for the presentation layer.
const EVENT_BUFFER: usize = 64;

/// Coordinates one upload at a time for a presentation session.
pub struct UploadCoordinator {
    client_id: ClientId,
    transfer: Arc<dyn TransferClient>,
    config: UploadConfig,
    session: Arc<UploadSession>,
    selected: Mutex<Option<PathBuf>>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: Mutex<CancellationToken>,
}

impl UploadCoordinator {
    /// Creates a coordinator bound to a session-wide client id.
    pub fn new(
        client_id: ClientId,
        transfer: Arc<dyn TransferClient>,
        config: UploadConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            client_id,
            transfer,
            config,
            session: Arc::new(UploadSession::new()),
            selected: Mutex::new(None),
            events_tx,
            events_rx: Some(events_rx),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Takes the lifecycle event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a sender for the same event stream, for the correlator.
    pub fn events_sender(&self) -> mpsc::Sender<UploadEvent> {
        self.events_tx.clone()
    }

    /// The session-wide correlation id.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The live session value (shared with the correlator).
    pub fn session(&self) -> Arc<UploadSession> {
        self.session.clone()
    }

    /// Returns the cancellation token for the current upload.
    ///
    /// The token is rotated on every [`Self::select_file`], so cancelling
    /// one upload never poisons the next.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap().clone()
    }

    /// Returns `true` when the session has been in `Assembling` longer
    /// than the configured bound without a completion event.
    pub fn is_stuck(&self) -> bool {
        self.config
            .stuck_after
            .is_some_and(|bound| self.session.is_stuck(bound))
    }

    /// Selects a file for upload and resets the session.
    ///
    /// Valid only while idle or in a terminal state; does not start the
    /// transfer. Empty files are rejected up front.
    pub fn select_file(&self, path: &Path) -> Result<(), UploadError> {
        let state = self.session.state();
        if matches!(state, UploadState::Transferring | UploadState::Assembling) {
            return Err(UploadError::InvalidState {
                op: "select file",
                state,
            });
        }

        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )
            .into());
        }
        if meta.len() == 0 {
            return Err(UploadError::EmptyFile);
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let total_chunks = meta.len().div_ceil(self.config.chunk_size);

        *self.selected.lock().unwrap() = Some(path.to_path_buf());
        *self.cancel.lock().unwrap() = CancellationToken::new();
        self.session.apply(SessionEvent::FileSelected {
            filename: filename.clone(),
            total_size: meta.len(),
            total_chunks,
        });

        info!(
            file = %filename,
            bytes = meta.len(),
            chunks = total_chunks,
            "file selected"
        );
        Ok(())
    }

    /// Starts the upload of the selected file.
    ///
    /// Returns the state reached by the transfer itself: `Completed` for a
    /// whole-file upload, `Assembling` for a chunked one (final completion
    /// arrives via the notification channel). On failure the session moves
    /// to `Failed` and the error is returned.
    pub async fn start_upload(&self) -> Result<UploadState, UploadError> {
        let path = self
            .selected
            .lock()
            .unwrap()
            .clone()
            .ok_or(UploadError::NoFileSelected)?;

        let state = self.session.state();
        if state != UploadState::Idle {
            return Err(UploadError::InvalidState {
                op: "start upload",
                state,
            });
        }

        let total_size = self.session.total_size();
        let filename = self.session.filename();
        let cancel = self.cancel_token();

        if total_size <= self.config.chunk_size {
            if cancel.is_cancelled() {
                return Err(self.fail(UploadError::Cancelled));
            }
            match self.upload_whole(&path, &filename).await {
                Ok(document_id) => {
                    self.session.apply(SessionEvent::WholeUploadSucceeded {
                        document_id: document_id.clone(),
                    });
                    self.emit(UploadEvent::Progress {
                        percent: 100,
                        completed_chunks: 1,
                        total_chunks: 1,
                    });
                    self.emit(UploadEvent::StateChanged {
                        state: UploadState::Completed,
                    });
                    self.emit(UploadEvent::Completed {
                        document_id: document_id.clone(),
                    });
                    info!(%document_id, file = %filename, "whole-file upload completed");
                    Ok(UploadState::Completed)
                }
                Err(e) => Err(self.fail(e)),
            }
        } else {
            self.session.apply(SessionEvent::TransferStarted);
            self.emit(UploadEvent::StateChanged {
                state: UploadState::Transferring,
            });
            match self.upload_chunks(&path, &filename, &cancel).await {
                Ok(()) => Ok(UploadState::Assembling),
                Err(e) => Err(self.fail(e)),
            }
        }
    }

    async fn upload_whole(&self, path: &Path, filename: &str) -> Result<String, UploadError> {
        let data = tokio::fs::read(path).await?;
        self.transfer
            .upload_whole(filename, data, self.client_id.as_str())
            .await
    }

    /// Sequentially transfers every chunk; stops at the first failure.
    async fn upload_chunks(
        &self,
        path: &Path,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<(), UploadError> {
        let chunk_size = self.config.chunk_size;
        let mut reader = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || ChunkReader::new(&path, chunk_size)
        })
        .await
        .map_err(|e| UploadError::Task(e.to_string()))??;

        let mut document_id: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }

            // File reads are blocking I/O; keep them off the async runtime.
            let (returned, chunk) = tokio::task::spawn_blocking(move || {
                let mut r = reader;
                let chunk = r.next_chunk();
                (r, chunk)
            })
            .await
            .map_err(|e| UploadError::Task(e.to_string()))?;
            reader = returned;

            let Some(chunk) = chunk? else {
                break;
            };

            let req = ChunkRequest {
                data: &chunk.data,
                document_id: document_id.as_deref().unwrap_or(NEW_DOCUMENT),
                index: chunk.index,
                total: chunk.total,
                filename,
                // The correlation id rides only on the first chunk.
                client_id: (chunk.index == 0).then(|| self.client_id.as_str()),
            };
            let confirmed = self.transfer.upload_chunk(req).await?;
            if document_id.is_none() {
                document_id = Some(confirmed.clone());
            }

            let new_state = self.session.apply(SessionEvent::ChunkSucceeded {
                index: chunk.index,
                document_id: confirmed,
            });

            debug!(
                chunk = chunk.index,
                total = chunk.total,
                progress = self.session.progress(),
                "chunk acknowledged"
            );
            self.emit(UploadEvent::Progress {
                percent: self.session.progress(),
                completed_chunks: self.session.completed_chunks(),
                total_chunks: chunk.total,
            });

            if new_state == UploadState::Assembling {
                self.emit(UploadEvent::StateChanged {
                    state: UploadState::Assembling,
                });
                info!(
                    document_id = %self.session.document_id().unwrap_or_default(),
                    "all chunks transferred, awaiting server-side processing"
                );
            }
        }

        Ok(())
    }

    /// Records the failure in the session and passes the error back.
    fn fail(&self, err: UploadError) -> UploadError {
        self.session.apply(SessionEvent::TransferFailed {
            error: err.to_string(),
        });
        self.emit(UploadEvent::StateChanged {
            state: UploadState::Failed,
        });
        self.emit(UploadEvent::Failed {
            error: err.to_string(),
        });
        error!(error = %err, "upload failed");
        err
    }

    /// Best-effort event delivery — the presentation layer lagging must
    /// never stall the transfer sequence.
    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.try_send(event);
    }
}
