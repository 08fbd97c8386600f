use crate::ChunkError;

/// A contiguous byte range `[start, end)` within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Inclusive start offset.
    pub start: u64,
    /// Exclusive end offset.
    pub end: u64,
}

impl ByteRange {
    /// Length of the range in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` if the range covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Deterministic split of a file into fixed-size chunks.
///
/// A plan holds no state beyond its two inputs, so the same `(total_size,
/// chunk_size)` pair always produces the same ranges and iteration can be
/// restarted at any point by recomputing from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    /// Creates a plan for `total_size` bytes in chunks of `chunk_size`.
    pub fn new(total_size: u64, chunk_size: u64) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidChunkSize);
        }
        Ok(Self {
            total_size,
            chunk_size,
        })
    }

    /// Total bytes covered by the plan.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Chunk size the plan was built with.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of chunks: `ceil(total_size / chunk_size)`.
    pub fn total_chunks(&self) -> u64 {
        self.total_size.div_ceil(self.chunk_size)
    }

    /// Returns the byte range of chunk `index`, or `None` past the end.
    ///
    /// The final range is truncated to the file size, so every range
    /// satisfies `len() <= chunk_size`.
    pub fn range(&self, index: u64) -> Option<ByteRange> {
        if index >= self.total_chunks() {
            return None;
        }
        let start = index * self.chunk_size;
        let end = std::cmp::min(start + self.chunk_size, self.total_size);
        Some(ByteRange { start, end })
    }

    /// Lazily yields all ranges in index order.
    pub fn ranges(&self) -> impl Iterator<Item = ByteRange> + '_ {
        let plan = *self;
        (0..self.total_chunks()).map(move |i| {
            let start = i * plan.chunk_size;
            let end = std::cmp::min(start + plan.chunk_size, plan.total_size);
            ByteRange { start, end }
        })
    }
}
