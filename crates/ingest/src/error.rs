use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::normalize::MissingFieldError;

/// Errors raised while reading sources or writing/reading artifacts.
///
/// Every variant carries the file it concerns so a run summary can name it.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: MissingFieldError,
    },

    #[error("{}: malformed tabular data: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{line}: row has {found} fields, header has {expected}", .path.display())]
    RowTooLong {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: invalid artifact line: {source}", .path.display())]
    Json {
        path: PathBuf,
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The file this error concerns.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Schema { path, .. }
            | Self::Csv { path, .. }
            | Self::RowTooLong { path, .. }
            | Self::Json { path, .. } => path,
        }
    }

    /// True when the file was rejected for lacking a required column.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}
