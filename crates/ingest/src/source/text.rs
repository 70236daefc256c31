use std::path::Path;

use kbprep_core::{Chunk, Metadata};

use crate::chunker::{ChunkConfig, Chunks};
use crate::error::IngestError;
use crate::normalize::{normalize, RawRecord};

use super::file_stem;

/// Treats a whole text file as one record titled after the file stem.
#[derive(Debug)]
pub struct TextChunks {
    metadata: Metadata,
    chunks: Chunks,
}

impl TextChunks {
    pub fn open(path: &Path, config: &ChunkConfig) -> Result<Self, IngestError> {
        let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
        let title = file_stem(path);
        let record = normalize(RawRecord::Textual {
            title: &title,
            bytes: &bytes,
        });
        Ok(Self {
            chunks: Chunks::new(&record.content, config),
            metadata: record.metadata,
        })
    }
}

impl Iterator for TextChunks {
    type Item = Result<Chunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let text = self.chunks.next()?;
        Some(Ok(Chunk::new(self.metadata.clone(), text)))
    }
}
