use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};
use kbprep_core::{Chunk, Metadata};

use crate::chunker::{ChunkConfig, Chunks};
use crate::error::IngestError;
use crate::normalize::{normalize, RawRecord, TabularSchema};

/// Streams a delimited file row by row, yielding each row's chunks in order.
///
/// Short rows are accepted and their missing columns read as `""`. A row
/// longer than the header, or one the parser rejects, ends the stream with
/// an error; nothing after it is read.
pub struct TabularChunks {
    path: PathBuf,
    schema: TabularSchema,
    /// Number of header columns.
    width: usize,
    rows: StringRecordsIntoIter<File>,
    config: ChunkConfig,
    current: Option<(Metadata, Chunks)>,
    failed: bool,
}

impl std::fmt::Debug for TabularChunks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularChunks")
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl TabularChunks {
    pub fn open(path: &Path, config: &ChunkConfig) -> Result<Self, IngestError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::csv(path, e))?;
        let headers = reader.headers().map_err(|e| IngestError::csv(path, e))?;
        let width = headers.len();
        let schema =
            TabularSchema::from_headers(headers).map_err(|source| IngestError::Schema {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            width,
            rows: reader.into_records(),
            config: *config,
            current: None,
            failed: false,
        })
    }
}

impl Iterator for TabularChunks {
    type Item = Result<Chunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((metadata, chunks)) = &mut self.current {
                if let Some(text) = chunks.next() {
                    return Some(Ok(Chunk::new(metadata.clone(), text)));
                }
                self.current = None;
            }

            match self.rows.next()? {
                Ok(row) if row.len() > self.width => {
                    self.failed = true;
                    return Some(Err(IngestError::RowTooLong {
                        path: self.path.clone(),
                        line: row.position().map_or(0, |p| p.line()),
                        expected: self.width,
                        found: row.len(),
                    }));
                }
                Ok(row) => {
                    let record = normalize(RawRecord::Tabular {
                        schema: &self.schema,
                        row: &row,
                    });
                    let chunks = Chunks::new(&record.content, &self.config);
                    self.current = Some((record.metadata, chunks));
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(IngestError::csv(&self.path, e)));
                }
            }
        }
    }
}
