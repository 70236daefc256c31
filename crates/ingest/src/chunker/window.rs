//! The chunking window itself.

use std::iter::FusedIterator;

use kbprep_core::ConfigError;

use super::types::ChunkConfig;

/// Unicode whitespace plus the ASCII information separators U+001C..=U+001F.
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_space).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Lazy sequence of chunks over one normalized text.
///
/// Only the normalized string is held; each window is located by walking
/// characters from the previous cursor.
#[derive(Debug, Clone)]
pub struct Chunks {
    text: String,
    /// Byte offset of the next window start. `text.len()` once exhausted.
    start: usize,
    size: usize,
    overlap: usize,
}

impl Chunks {
    pub fn new(text: &str, config: &ChunkConfig) -> Self {
        Self {
            text: normalize_whitespace(text),
            start: 0,
            size: config.size(),
            overlap: config.overlap(),
        }
    }

    /// The whitespace-normalized text being chunked.
    pub fn normalized(&self) -> &str {
        &self.text
    }
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let len = self.text.len();
        if self.start >= len {
            return None;
        }

        let end = advance(&self.text, self.start, self.size);
        let piece = self.text[self.start..end].to_string();

        if end == len {
            self.start = len;
        } else {
            // Never step backwards or stand still, whatever the overlap.
            let next = retreat(&self.text, end, self.overlap);
            self.start = if next > self.start { next } else { end };
        }
        Some(piece)
    }
}

impl FusedIterator for Chunks {}

/// Byte offset `n` characters after `from`, capped at the end of `text`.
fn advance(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Byte offset `n` characters before `to`, floored at zero.
fn retreat(text: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    text[..to]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map_or(0, |(i, _)| i)
}

/// Chunk `text` with an already validated configuration.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    Chunks::new(text, config).collect()
}

/// Chunk `text` with raw window parameters, rejecting `size == 0` and
/// `overlap >= size` up front.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ConfigError> {
    let config = ChunkConfig::new(size, overlap)?;
    Ok(chunk_text(text, &config))
}
