//! Source ingestion: chunking, record normalization, source adapters and the
//! prepare stage that turns a directory of `.csv`/`.txt` files into JSON Lines
//! artifacts.

pub mod artifact;
pub mod chunker;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod source;

pub use artifact::{artifact_path, discover_artifacts, ArtifactReader, ArtifactWriter};
pub use chunker::{chunk, chunk_text, ChunkConfig, Chunks};
pub use discovery::{discover, SourceFile};
pub use error::IngestError;
pub use normalize::{normalize, MissingFieldError, RawRecord, TabularSchema};
pub use pipeline::{prepare_file, FileReport, PrepareOptions, PrepareSummary, Preparer};
pub use source::{SourceChunks, SourceKind};
