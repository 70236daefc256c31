use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kbprep_core::{ConfigError, FailurePolicy};
use kbprep_ingest::ChunkConfig;

/// Prepare documents for a knowledge base and push them into it.
///
/// `prepare` turns `.csv`/`.txt` sources into JSON Lines artifacts,
/// `push` submits those artifacts, `ingest` does both without artifacts.
#[derive(Parser, Debug)]
#[command(name = "kbprep", version, about = "Knowledge base ingestion pipeline")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk every source file into one `.jsonl` artifact
    Prepare(PrepareArgs),
    /// Submit every chunk of every artifact to the knowledge base
    Push(PushArgs),
    /// Chunk sources and submit them directly, writing no artifacts
    Ingest(IngestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    /// Maximum characters per chunk
    #[arg(long = "chunk", env = "KBPREP_CHUNK_SIZE", default_value_t = 800)]
    pub size: usize,

    /// Characters repeated between consecutive chunks
    #[arg(long, env = "KBPREP_OVERLAP", default_value_t = 120)]
    pub overlap: usize,
}

impl ChunkArgs {
    pub fn config(&self) -> Result<ChunkConfig, ConfigError> {
        ChunkConfig::new(self.size, self.overlap)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Dataset (knowledge base) id; overrides DIFY_KB_ID
    #[arg(long)]
    pub kb: Option<String>,

    /// Milliseconds to wait between submissions
    #[arg(long, env = "KBPREP_SLEEP_MS", default_value_t = 200)]
    pub sleep_ms: u64,

    /// Stop at the first failed chunk instead of reporting at the end
    #[arg(long)]
    pub fail_fast: bool,
}

impl TargetArgs {
    pub fn policy(&self) -> FailurePolicy {
        FailurePolicy::from_fail_fast(self.fail_fast)
    }
}

#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// Directory scanned recursively for sources
    #[arg(long, env = "KBPREP_SRC", default_value = "data/raw")]
    pub src: PathBuf,

    /// Directory receiving one artifact per source
    #[arg(long, env = "KBPREP_OUT", default_value = "data/processed")]
    pub out: PathBuf,

    #[command(flatten)]
    pub chunking: ChunkArgs,

    /// Keep preparing after a file fails; exit non-zero at the end
    #[arg(long)]
    pub keep_going: bool,
}

impl PrepareArgs {
    pub fn policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::FailFast
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// A `.jsonl` artifact, or a directory holding them
    #[arg(long, env = "KBPREP_OUT", default_value = "data/processed")]
    pub input: PathBuf,

    /// Also collect artifacts from subdirectories of `--input`
    #[arg(long)]
    pub recursive: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Directory scanned recursively for sources
    #[arg(long, env = "KBPREP_SRC", default_value = "data/raw")]
    pub src: PathBuf,

    #[command(flatten)]
    pub chunking: ChunkArgs,

    #[command(flatten)]
    pub target: TargetArgs,
}
