//! JSON Lines artifacts: one `{"meta": {...}, "text": "..."}` object per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use kbprep_core::Chunk;

use crate::error::IngestError;

pub const ARTIFACT_EXTENSION: &str = "jsonl";

/// `<out_dir>/<stem>.jsonl`
pub fn artifact_path(out_dir: &Path, stem: &str) -> PathBuf {
    out_dir.join(format!("{stem}.{ARTIFACT_EXTENSION}"))
}

/// Writes chunks to a `.part` sibling and renames it into place on commit.
///
/// Dropping an uncommitted writer removes the partial file, so a failed
/// source never leaves a truncated artifact behind.
#[derive(Debug)]
pub struct ArtifactWriter {
    path: PathBuf,
    part: PathBuf,
    out: Option<BufWriter<File>>,
    lines: u64,
}

impl ArtifactWriter {
    pub fn create(path: &Path) -> Result<Self, IngestError> {
        let mut part = path.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);
        let file = File::create(&part).map_err(|e| IngestError::io(&part, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            part,
            out: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    pub fn write(&mut self, chunk: &Chunk) -> Result<(), IngestError> {
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *out, chunk).map_err(|source| IngestError::Json {
            path: self.path.clone(),
            line: self.lines + 1,
            source,
        })?;
        out.write_all(b"\n")
            .map_err(|e| IngestError::io(&self.part, e))?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and move the artifact into place. Returns the number of lines written.
    pub fn commit(mut self) -> Result<u64, IngestError> {
        if let Some(out) = self.out.take() {
            let file = out
                .into_inner()
                .map_err(|e| IngestError::io(&self.part, e.into_error()))?;
            file.sync_all().map_err(|e| IngestError::io(&self.part, e))?;
        }
        std::fs::rename(&self.part, &self.path).map_err(|e| IngestError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), lines = self.lines, "artifact written");
        Ok(self.lines)
    }
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        // Close before unlinking. After a successful commit the part file is
        // already gone and the removal is a no-op.
        drop(self.out.take());
        let _ = std::fs::remove_file(&self.part);
    }
}

/// Lazily reads chunks back from an artifact, skipping blank lines.
#[derive(Debug)]
pub struct ArtifactReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: u64,
}

impl ArtifactReader {
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }
}

impl Iterator for ArtifactReader {
    type Item = Result<Chunk, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(IngestError::io(&self.path, e))),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| IngestError::Json {
                path: self.path.clone(),
                line: self.line,
                source,
            }));
        }
    }
}

/// Artifacts to push from `input`, sorted.
///
/// A file is taken as-is whatever its extension. A directory contributes its
/// `*.jsonl` files, only the top level unless `recursive`. A missing path
/// yields nothing.
pub fn discover_artifacts(input: &Path, recursive: bool) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(input)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|e| e == ARTIFACT_EXTENSION))
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use kbprep_core::Metadata;

    use super::*;

    fn chunk(title: &str, text: &str) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), title.into());
        Chunk::new(metadata, text)
    }

    #[test]
    fn lines_have_exactly_meta_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "doc");
        let mut writer = ArtifactWriter::create(&path).unwrap();
        writer.write(&chunk("Doc", "first")).unwrap();
        writer.write(&chunk("Doc", "第二")).unwrap();
        assert_eq!(writer.commit().unwrap(), 2);

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
            assert_eq!(keys, vec!["meta", "text"]);
        }
        assert!(lines[1].contains("第二"));
    }

    #[test]
    fn dropped_writer_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "partial");
        {
            let mut writer = ArtifactWriter::create(&path).unwrap();
            writer.write(&chunk("x", "y")).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn commit_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "doc");
        std::fs::write(&path, "stale\n").unwrap();

        let mut writer = ArtifactWriter::create(&path).unwrap();
        writer.write(&chunk("Doc", "fresh")).unwrap();
        writer.commit().unwrap();

        let chunks: Vec<Chunk> = ArtifactReader::open(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks, vec![chunk("Doc", "fresh")]);
    }

    #[test]
    fn reader_skips_blank_lines_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.jsonl");
        std::fs::write(
            &path,
            "{\"meta\":{\"title\":\"A\"},\"text\":\"one\"}\n\n{not json}\n{\"text\":\"two\"}\n",
        )
        .unwrap();

        let items: Vec<_> = ArtifactReader::open(&path).unwrap().collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().text, "one");
        match &items[1] {
            Err(IngestError::Json { line, .. }) => assert_eq!(*line, 3),
            other => panic!("expected Json error, got: {other:?}"),
        }
        assert!(items[2].as_ref().unwrap().metadata.is_empty());
    }

    #[test]
    fn artifact_discovery_is_flat_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.jsonl"), "").unwrap();
        std::fs::write(dir.path().join("a.jsonl"), "").unwrap();
        std::fs::write(dir.path().join("c.json"), "").unwrap();
        std::fs::write(dir.path().join("nested/d.jsonl"), "").unwrap();

        let found = discover_artifacts(dir.path(), false);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);

        let nested = discover_artifacts(dir.path(), true);
        let relative: Vec<_> = nested
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("a.jsonl"),
                PathBuf::from("b.jsonl"),
                PathBuf::from("nested/d.jsonl"),
            ]
        );
    }

    #[test]
    fn single_artifact_file_is_selected_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.txt");
        std::fs::write(&path, "{\"text\":\"x\"}\n").unwrap();
        assert_eq!(discover_artifacts(&path, false), vec![path.clone()]);
        assert!(discover_artifacts(&dir.path().join("absent"), true).is_empty());
    }
}
