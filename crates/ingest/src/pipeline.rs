//! Prepare stage: discover sources, chunk them, write one artifact per file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use kbprep_core::{FailurePolicy, Observer, ProgressEvent};

use crate::artifact::ArtifactWriter;
use crate::chunker::ChunkConfig;
use crate::discovery::{discover, SourceFile};
use crate::error::IngestError;
use crate::source::SourceChunks;

/// Where to read sources, where to write artifacts, and how to chunk.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub src: PathBuf,
    pub out: PathBuf,
    pub chunking: ChunkConfig,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            src: PathBuf::from("data/raw"),
            out: PathBuf::from("data/processed"),
            chunking: ChunkConfig::default(),
        }
    }
}

/// Outcome of preparing a single source file.
#[derive(Debug)]
pub struct FileReport {
    pub source: SourceFile,
    pub artifact: PathBuf,
    /// Number of chunks written, or why the file was abandoned.
    pub outcome: Result<u64, IngestError>,
}

/// Totals for one prepare run.
#[derive(Debug, Default)]
pub struct PrepareSummary {
    /// Recognized files found under the source root.
    pub discovered: usize,
    /// Files whose artifact was written.
    pub prepared: usize,
    pub chunks: u64,
    pub failures: Vec<IngestError>,
}

impl PrepareSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn no_input(&self) -> bool {
        self.discovered == 0
    }
}

/// Drives discovery and the source adapters, reporting through an [`Observer`].
pub struct Preparer<'o> {
    options: PrepareOptions,
    observer: &'o dyn Observer,
}

impl<'o> Preparer<'o> {
    pub fn new(options: PrepareOptions, observer: &'o dyn Observer) -> Self {
        Self { options, observer }
    }

    /// Lazily prepare every discovered file, one [`FileReport`] per item.
    ///
    /// Nothing is read until the iterator is advanced. Calling this again
    /// rescans the source root and starts over.
    pub fn files(&self) -> Result<PreparedFiles<'_, 'o>, IngestError> {
        std::fs::create_dir_all(&self.options.out)
            .map_err(|e| IngestError::io(&self.options.out, e))?;

        let files = discover(&self.options.src);
        if files.is_empty() {
            self.observer.on_event(&ProgressEvent::NoInput {
                root: &self.options.src,
            });
        }
        Ok(PreparedFiles {
            preparer: self,
            discovered: files.len(),
            pending: files.into_iter(),
            claimed: HashSet::new(),
        })
    }

    /// Prepare everything. Under [`FailurePolicy::FailFast`] the first failed
    /// file ends the run with its error.
    pub fn run(&self, policy: FailurePolicy) -> Result<PrepareSummary, IngestError> {
        let files = self.files()?;
        let mut summary = PrepareSummary {
            discovered: files.discovered(),
            ..PrepareSummary::default()
        };
        for report in files {
            match report.outcome {
                Ok(chunks) => {
                    summary.prepared += 1;
                    summary.chunks += chunks;
                }
                Err(e) if policy.stops_on_failure() => return Err(e),
                Err(e) => summary.failures.push(e),
            }
        }
        Ok(summary)
    }
}

/// Iterator returned by [`Preparer::files`].
pub struct PreparedFiles<'p, 'o> {
    preparer: &'p Preparer<'o>,
    discovered: usize,
    pending: std::vec::IntoIter<SourceFile>,
    claimed: HashSet<PathBuf>,
}

impl PreparedFiles<'_, '_> {
    pub fn discovered(&self) -> usize {
        self.discovered
    }
}

impl Iterator for PreparedFiles<'_, '_> {
    type Item = FileReport;

    fn next(&mut self) -> Option<FileReport> {
        let source = self.pending.next()?;
        let observer = self.preparer.observer;
        let artifact = source.artifact_path(&self.preparer.options.out);

        if !self.claimed.insert(artifact.clone()) {
            observer.on_event(&ProgressEvent::ArtifactOverwritten {
                artifact: &artifact,
                source: &source.path,
            });
        }

        observer.on_event(&ProgressEvent::FileStarted { path: &source.path });
        let outcome = prepare_file(&source, &artifact, &self.preparer.options.chunking);
        match &outcome {
            Ok(chunks) => observer.on_event(&ProgressEvent::FileFinished {
                path: &source.path,
                chunks: *chunks,
            }),
            Err(e) => observer.on_event(&ProgressEvent::FileFailed {
                path: &source.path,
                error: e,
            }),
        }

        Some(FileReport {
            source,
            artifact,
            outcome,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

/// Chunk one source file into `artifact`, returning the number of lines written.
///
/// The source is opened (and a tabular header validated) before the artifact
/// is created, so a schema error leaves no output for the file.
pub fn prepare_file(
    source: &SourceFile,
    artifact: &Path,
    chunking: &ChunkConfig,
) -> Result<u64, IngestError> {
    let chunks = SourceChunks::open(&source.path, source.kind, chunking)?;
    let mut writer = ArtifactWriter::create(artifact)?;
    for chunk in chunks {
        writer.write(&chunk?)?;
    }
    writer.commit()
}
