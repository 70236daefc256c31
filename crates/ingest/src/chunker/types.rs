//! Chunk window configuration.

use kbprep_core::ConfigError;

/// Default window length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default number of characters shared by adjacent windows.
pub const DEFAULT_OVERLAP: usize = 120;

/// Validated window parameters: `size > 0` and `overlap < size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    size: usize,
    overlap: usize,
}

impl ChunkConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk size",
                reason: "must be a positive integer".to_string(),
            });
        }
        if overlap >= size {
            return Err(ConfigError::Invalid {
                key: "overlap",
                reason: format!("must be smaller than the chunk size ({overlap} >= {size})"),
            });
        }
        Ok(Self { size, overlap })
    }

    /// Maximum characters per chunk.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Characters repeated at the start of each chunk after the first.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// How far the window start advances between chunks.
    pub fn stride(&self) -> usize {
        self.size - self.overlap
    }

    /// Upper bound on the number of chunks for a normalized text of `chars` characters.
    pub fn max_chunks(&self, chars: usize) -> usize {
        chars.div_ceil(self.stride())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}
