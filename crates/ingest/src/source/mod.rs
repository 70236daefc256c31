//! Source adapters: turn one input file into a lazy stream of chunks.

mod tabular;
mod text;

use std::path::Path;

use kbprep_core::Chunk;

use crate::chunker::ChunkConfig;
use crate::error::IngestError;

pub use tabular::TabularChunks;
pub use text::TextChunks;

/// Recognized input formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Delimited file with a header row (`.csv`).
    Tabular,
    /// Plain text file (`.txt`).
    Text,
}

impl SourceKind {
    /// Classify a path by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Tabular),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Chunks produced by whichever adapter matches the file.
#[derive(Debug)]
pub enum SourceChunks {
    Tabular(TabularChunks),
    Text(TextChunks),
}

impl SourceChunks {
    /// Open `path` with the adapter for `kind`.
    ///
    /// Header validation and whole-file reads happen here, so a schema error
    /// surfaces before the first chunk is produced.
    pub fn open(path: &Path, kind: SourceKind, config: &ChunkConfig) -> Result<Self, IngestError> {
        Ok(match kind {
            SourceKind::Tabular => Self::Tabular(TabularChunks::open(path, config)?),
            SourceKind::Text => Self::Text(TextChunks::open(path, config)?),
        })
    }
}

impl Iterator for SourceChunks {
    type Item = Result<Chunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Tabular(chunks) => chunks.next(),
            Self::Text(chunks) => chunks.next(),
        }
    }
}

/// File name without extension, used for titles and artifact names.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
