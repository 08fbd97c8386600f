use serde::{Deserialize, Deserializer};

/// Accepts a document id serialized as either a JSON number or a string.
///
/// The server uses integer ids internally but stringifies them on the
/// chunked endpoint, so both forms appear on the wire.
pub(crate) fn de_document_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}

/// Response from `POST /api/v1/documents/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentResponse {
    #[serde(deserialize_with = "de_document_id")]
    pub id: String,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Response from `POST /api/v1/documents/upload-chunked`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkUploadResponse {
    #[serde(deserialize_with = "de_document_id")]
    pub document_id: String,
    #[serde(default)]
    pub chunk_index: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One chunk upload request.
#[derive(Debug, Clone)]
pub struct ChunkUpload {
    /// Raw chunk bytes.
    pub data: Vec<u8>,
    /// Server-assigned document id, or [`crate::NEW_DOCUMENT`] on chunk 0.
    pub document_id: String,
    /// 0-based chunk index.
    pub chunk_index: u64,
    /// Total number of chunks for the file.
    pub total_chunks: u64,
    /// Original filename.
    pub filename: String,
    /// Correlation id for completion notifications; sent only on chunk 0.
    pub client_id: Option<String>,
}
