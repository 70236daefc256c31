mod cli;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use kbprep_core::config::load_dotenv;
use kbprep_core::{Config, Observer, ProgressEvent, TracingObserver};
use kbprep_ingest::source::file_stem;
use kbprep_ingest::{
    discover, discover_artifacts, ArtifactReader, PrepareOptions, Preparer, SourceChunks,
};
use kbprep_sink::{DifySink, PushReport, Pusher, Sink};

use crate::cli::{CliArgs, Command, IngestArgs, PrepareArgs, PushArgs, TargetArgs};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    match args.command {
        Command::Prepare(args) => prepare(&args),
        Command::Push(args) => push(&args).await,
        Command::Ingest(args) => ingest(&args).await,
    }
}

fn prepare(args: &PrepareArgs) -> Result<ExitCode> {
    let options = PrepareOptions {
        src: args.src.clone(),
        out: args.out.clone(),
        chunking: args.chunking.config().context("invalid chunking parameters")?,
    };
    let observer = TracingObserver;
    let preparer = Preparer::new(options, &observer);

    let summary = preparer
        .run(args.policy())
        .context("prepare stopped at a failed file (use --keep-going to continue past it)")?;
    if summary.no_input() {
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        files = summary.prepared,
        chunks = summary.chunks,
        failed = summary.failures.len(),
        out = %args.out.display(),
        "prepare complete"
    );
    Ok(exit_code(summary.is_success()))
}

async fn push(args: &PushArgs) -> Result<ExitCode> {
    let sink = connect(&args.target)?;
    let observer = TracingObserver;
    let pusher = pusher(&sink, &observer, &args.target);

    let artifacts = discover_artifacts(&args.input, args.recursive);
    if artifacts.is_empty() {
        warn!(input = %args.input.display(), "no artifacts found; run `kbprep prepare` first");
        return Ok(ExitCode::SUCCESS);
    }

    let mut total = PushReport::default();
    for path in &artifacts {
        let reader = match ArtifactReader::open(path) {
            Ok(reader) => reader,
            Err(e) if args.target.fail_fast => return Err(e).context("cannot read artifact"),
            Err(e) => {
                observer.on_event(&ProgressEvent::FileFailed { path, error: &e });
                total.files_failed += 1;
                continue;
            }
        };
        let report = pusher.push(path, &file_stem(path), reader).await?;
        total.merge(report);
    }

    finish_push(sink.name(), total)
}

async fn ingest(args: &IngestArgs) -> Result<ExitCode> {
    let chunking = args.chunking.config().context("invalid chunking parameters")?;
    let sink = connect(&args.target)?;
    let observer = TracingObserver;
    let pusher = pusher(&sink, &observer, &args.target);

    let sources = discover(&args.src);
    if sources.is_empty() {
        observer.on_event(&ProgressEvent::NoInput { root: &args.src });
        return Ok(ExitCode::SUCCESS);
    }

    let mut total = PushReport::default();
    for source in &sources {
        let chunks = match SourceChunks::open(&source.path, source.kind, &chunking) {
            Ok(chunks) => chunks,
            Err(e) if args.target.fail_fast => return Err(e).context("cannot read source"),
            Err(e) => {
                observer.on_event(&ProgressEvent::FileFailed {
                    path: &source.path,
                    error: &e,
                });
                total.files_failed += 1;
                continue;
            }
        };
        let report = pusher.push(&source.path, &source.stem(), chunks).await?;
        total.merge(report);
    }

    finish_push(sink.name(), total)
}

/// Resolve sink settings and fail before any input is touched if they are incomplete.
fn connect(target: &TargetArgs) -> Result<DifySink> {
    let config = Config::from_env();
    config.log_summary();
    let sink_config = config.sink.with_dataset_id(target.kb.clone());
    DifySink::new(&sink_config)
        .context("knowledge base is not configured (set DIFY_API_KEY and DIFY_KB_ID, or pass --kb)")
}

fn pusher<'a>(sink: &'a DifySink, observer: &'a dyn Observer, target: &TargetArgs) -> Pusher<'a> {
    Pusher::new(sink)
        .with_observer(observer)
        .with_pacing(Duration::from_millis(target.sleep_ms))
        .with_policy(target.policy())
}

fn finish_push(sink: &str, total: PushReport) -> Result<ExitCode> {
    info!(
        sink,
        submitted = total.submitted,
        failed = total.failed,
        files_failed = total.files_failed,
        "push complete; check the knowledge base for indexing status"
    );
    Ok(exit_code(total.is_success()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
