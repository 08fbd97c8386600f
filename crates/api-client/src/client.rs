//! Ingestion API client.
//!
//! Async HTTP client using `reqwest` with multipart form uploads.

use reqwest::multipart;
use tracing::debug;

use crate::ApiError;
use crate::types::{ChunkUpload, ChunkUploadResponse, DocumentResponse};

/// Sentinel document id sent on the very first chunk, before the server
/// has assigned a real one.
pub const NEW_DOCUMENT: &str = "new";

/// Client for the document ingestion endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new client for the given base URL (e.g. `http://host:8000`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Uploads an entire file in a single multipart request.
    ///
    /// Returns the server-assigned document id.
    pub async fn upload_document(
        &self,
        filename: &str,
        data: Vec<u8>,
        client_id: &str,
    ) -> Result<String, ApiError> {
        let size = data.len();
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(data).file_name(filename.to_string()),
            )
            .text("client_id", client_id.to_string());

        let resp = self
            .http
            .post(format!("{}/api/v1/documents/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let body = read_success(resp).await?;

        let parsed: DocumentResponse = serde_json::from_slice(&body)?;
        debug!(document_id = %parsed.id, bytes = size, "whole-file upload accepted");
        Ok(parsed.id)
    }

    /// Uploads one chunk of a file.
    ///
    /// `client_id` is attached only when the caller sets it (chunk 0).
    /// Returns the document id confirmed by the server — callers adopt it
    /// after the first chunk and echo it on every subsequent one.
    pub async fn upload_chunk(&self, chunk: ChunkUpload) -> Result<String, ApiError> {
        let mut form = multipart::Form::new()
            .part(
                "file_chunk",
                multipart::Part::bytes(chunk.data).file_name(chunk.filename.clone()),
            )
            .text("document_id", chunk.document_id)
            .text("chunk_index", chunk.chunk_index.to_string())
            .text("total_chunks", chunk.total_chunks.to_string())
            .text("filename", chunk.filename);
        if let Some(client_id) = chunk.client_id {
            form = form.text("client_id", client_id);
        }

        let resp = self
            .http
            .post(format!("{}/api/v1/documents/upload-chunked", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let body = read_success(resp).await?;

        let parsed: ChunkUploadResponse = serde_json::from_slice(&body)?;
        debug!(
            document_id = %parsed.document_id,
            chunk_index = chunk.chunk_index,
            total_chunks = chunk.total_chunks,
            "chunk upload accepted"
        );
        Ok(parsed.document_id)
    }
}

/// Returns the response body on 2xx, or maps the status and server-supplied
/// detail string into [`ApiError::Status`].
async fn read_success(resp: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail: extract_detail(&body),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Pulls the `detail` field out of an error body, falling back to the raw
/// body so the caller always sees what the server said.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(str::to_owned)))
        .unwrap_or_else(|| body.to_string())
}
