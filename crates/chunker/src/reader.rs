use std::io::Read;
use std::path::Path;

use crate::plan::ChunkPlan;
use crate::{ChunkError, DEFAULT_CHUNK_SIZE};

/// One chunk of file data ready for transfer.
///
/// The payload is an immutable snapshot of the source range; it is never
/// mutated after the read.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk index in `[0, total)`.
    pub index: u64,
    /// Total number of chunks in the plan.
    pub total: u64,
    /// Byte offset of this chunk within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

/// Reads a file sequentially according to a [`ChunkPlan`].
pub struct ChunkReader {
    file: std::fs::File,
    plan: ChunkPlan,
    next_index: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (5 MiB) is used.
    pub fn new(path: &Path, chunk_size: u64) -> Result<Self, ChunkError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            plan: ChunkPlan::new(file_size, chunk_size)?,
            next_index: 0,
        })
    }

    /// Reads the next chunk. Returns `None` once the plan is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        let Some(range) = self.plan.range(self.next_index) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; range.len() as usize];
        self.file.read_exact(&mut buf)?;

        let chunk = Chunk {
            index: self.next_index,
            total: self.plan.total_chunks(),
            offset: range.start,
            data: buf,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }

    /// The plan this reader follows.
    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.plan.total_size()
    }

    /// Number of chunks remaining to read.
    pub fn remaining(&self) -> u64 {
        self.plan.total_chunks() - self.next_index
    }
}
