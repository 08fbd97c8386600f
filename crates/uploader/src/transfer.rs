//! Transfer seam between the coordinator and the ingestion API.
//!
//! `TransferClient` is implemented over the real HTTP client by
//! [`HttpTransfer`]. Using a trait keeps the coordinator decoupled from
//! transport and testable with mocks.

use std::future::Future;
use std::pin::Pin;

use docport_api::{ApiClient, ChunkUpload};

use crate::error::UploadError;

/// One chunk transfer, borrowed from the source file for the duration of
/// the call.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    pub data: &'a [u8],
    /// Server-confirmed document id, or the `"new"` sentinel on chunk 0.
    pub document_id: &'a str,
    pub index: u64,
    pub total: u64,
    pub filename: &'a str,
    /// Present only on chunk 0.
    pub client_id: Option<&'a str>,
}

/// Abstract transfer backend for one upload call.
pub trait TransferClient: Send + Sync {
    /// Uploads an entire file in one request; returns the document id.
    fn upload_whole<'a>(
        &'a self,
        filename: &'a str,
        data: Vec<u8>,
        client_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>>;

    /// Uploads one chunk; returns the server-confirmed document id.
    fn upload_chunk<'a>(
        &'a self,
        req: ChunkRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>>;
}

/// [`TransferClient`] backed by the real ingestion API.
pub struct HttpTransfer {
    api: ApiClient,
}

impl HttpTransfer {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl TransferClient for HttpTransfer {
    fn upload_whole<'a>(
        &'a self,
        filename: &'a str,
        data: Vec<u8>,
        client_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>> {
        Box::pin(async move {
            let id = self.api.upload_document(filename, data, client_id).await?;
            Ok(id)
        })
    }

    fn upload_chunk<'a>(
        &'a self,
        req: ChunkRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>> {
        let upload = ChunkUpload {
            data: req.data.to_vec(),
            document_id: req.document_id.to_string(),
            chunk_index: req.index,
            total_chunks: req.total,
            filename: req.filename.to_string(),
            client_id: req.client_id.map(str::to_owned),
        };
        Box::pin(async move {
            let id = self.api.upload_chunk(upload).await?;
            Ok(id)
        })
    }
}
