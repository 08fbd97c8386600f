//! HTTP client for the document ingestion API.
//!
//! Two operations: a single multipart upload for small files, and the
//! chunked upload used for anything larger than one chunk. Server-side
//! processing is asynchronous — a successful upload response only means
//! the bytes were received, not that the document is queryable yet.

mod client;
mod types;

pub use client::{ApiClient, NEW_DOCUMENT};
pub use types::{ChunkUpload, ChunkUploadResponse, DocumentResponse};

/// Errors from the ingestion API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
