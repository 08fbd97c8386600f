//! Upload coordination for the document ingestion pipeline.
//!
//! This crate implements the **client-side business logic** for getting a
//! document onto the server and knowing when it is actually queryable. It
//! is a library crate with no UI or transport dependencies — the real
//! HTTP backend plugs in through [`TransferClient`], and the presentation
//! layer consumes the coordinator's event stream.
//!
//! # Lifecycle
//!
//! 1. **Select** — stat the file, reset the session
//! 2. **Transfer** — one whole-file request, or strictly sequential chunks
//! 3. **Assemble** — all bytes sent; the server pipeline is still working
//! 4. **Complete** — the notification channel confirms processing finished
//!
//! Steps 2 and 4 ride two independently-timed async channels (chunk HTTP
//! responses and an out-of-band WebSocket push); the session state machine
//! reconciles them into one coherent status.

pub mod coordinator;
pub mod correlator;
pub mod error;
pub mod session;
pub mod transfer;
pub mod types;

// Re-export primary types for convenience.
pub use coordinator::UploadCoordinator;
pub use correlator::SessionCorrelator;
pub use error::UploadError;
pub use session::{SessionEvent, UploadSession, UploadState};
pub use transfer::{ChunkRequest, HttpTransfer, TransferClient};
pub use types::{ClientId, UploadConfig, UploadEvent};
