//! Chunk planning and file-backed chunk reading for document uploads.
//!
//! [`ChunkPlan`] is a pure value: given a total size and a chunk size it
//! yields the ordered byte ranges an upload is split into. [`ChunkReader`]
//! walks a plan over a real file and produces the chunk payloads.

mod plan;
mod reader;

pub use plan::{ByteRange, ChunkPlan};
pub use reader::{Chunk, ChunkReader};

/// Default chunk size: 5 MiB.
///
/// Matches the ingestion server's chunked-upload contract; files at or
/// below this size are sent in a single request instead.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Errors produced by the chunker crate.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}
