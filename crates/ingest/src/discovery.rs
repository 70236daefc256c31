//! Recursive discovery of recognized source files.

use std::path::{Path, PathBuf};

use crate::artifact::artifact_path;
use crate::source::{file_stem, SourceKind};

/// A discovered input file and the adapter that handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = SourceKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }

    /// Where this file's chunks are written under `out_dir`.
    pub fn artifact_path(&self, out_dir: &Path) -> PathBuf {
        artifact_path(out_dir, &self.stem())
    }
}

/// Walk `root` recursively and return every `.csv`/`.txt` file, sorted by path.
///
/// A missing or unreadable root yields an empty list, which callers report
/// as "no input found" rather than an error.
pub fn discover(root: &Path) -> Vec<SourceFile> {
    let mut files: Vec<SourceFile> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| SourceFile::new(e.into_path()))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
