//! Sliding-window text chunking.
//!
//! Text is whitespace-normalized (every run of whitespace becomes one space,
//! ends trimmed), then cut into windows of at most `size` characters where
//! consecutive windows share `overlap` characters. Lengths count Unicode
//! scalar values, never bytes.

mod types;
mod window;

pub use types::{ChunkConfig, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use window::{chunk, chunk_text, normalize_whitespace, Chunks};
