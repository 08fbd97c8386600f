//! Upload error types.

use crate::session::UploadState;

/// Errors produced while coordinating an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunking error: {0}")]
    Chunk(#[from] docport_chunker::ChunkError),

    /// Non-success HTTP status from the ingestion API. `detail` is the
    /// server's error string, verbatim when one was supplied.
    #[error("transport error ({status}): {detail}")]
    Transport { status: u16, detail: String },

    /// The request never produced an HTTP status (connect failure,
    /// malformed response body).
    #[error("connection error: {0}")]
    Connection(String),

    #[error("no file selected")]
    NoFileSelected,

    #[error("selected file is empty")]
    EmptyFile,

    #[error("cannot {op} while {state:?}")]
    InvalidState { op: &'static str, state: UploadState },

    #[error("upload cancelled")]
    Cancelled,

    #[error("task error: {0}")]
    Task(String),
}

impl From<docport_api::ApiError> for UploadError {
    fn from(err: docport_api::ApiError) -> Self {
        match err {
            docport_api::ApiError::Status { status, detail } => {
                UploadError::Transport { status, detail }
            }
            docport_api::ApiError::Http(e) => match e.status() {
                Some(status) => UploadError::Transport {
                    status: status.as_u16(),
                    detail: e.to_string(),
                },
                None => UploadError::Connection(e.to_string()),
            },
            docport_api::ApiError::Json(e) => {
                UploadError::Connection(format!("invalid response: {e}"))
            }
        }
    }
}
