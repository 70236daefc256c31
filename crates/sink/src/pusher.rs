//! Drains chunk streams into a [`Sink`], one submission at a time.
//!
//! Every chunk is submitted exactly once, in the order the stream yields it.
//! Failures are never retried here; the [`FailurePolicy`] decides whether the
//! stream keeps going.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use kbprep_core::{Chunk, FailurePolicy, NullObserver, Observer, ProgressEvent};
use tokio::time::Instant;

use crate::traits::{Sink, SinkError};

/// Why a fail-fast push stopped.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("{origin} #{ordinal}: {source}")]
    Submit {
        origin: String,
        ordinal: u64,
        #[source]
        source: SinkError,
    },

    #[error("{origin} #{ordinal}: unreadable chunk: {source}")]
    Input {
        origin: String,
        ordinal: u64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Counts for one or more pushed streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    pub submitted: u64,
    /// Chunks that were rejected by the sink or could not be read.
    pub failed: u64,
    /// Streams abandoned before their end, or that could not be opened.
    pub files_failed: u64,
}

impl PushReport {
    pub fn merge(&mut self, other: PushReport) {
        self.submitted += other.submitted;
        self.failed += other.failed;
        self.files_failed += other.files_failed;
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.files_failed == 0
    }
}

/// Sequential submitter with pacing between consecutive calls.
pub struct Pusher<'a> {
    sink: &'a dyn Sink,
    observer: &'a dyn Observer,
    pacing: Duration,
    policy: FailurePolicy,
    /// When the previous submission finished, shared across streams so
    /// pacing also applies between files.
    last_submit: Mutex<Option<Instant>>,
}

impl<'a> Pusher<'a> {
    pub fn new(sink: &'a dyn Sink) -> Self {
        Self {
            sink,
            observer: &NullObserver,
            pacing: Duration::ZERO,
            policy: FailurePolicy::default(),
            last_submit: Mutex::new(None),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Minimum delay between the end of one submission and the start of the next.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit every chunk from `chunks`, which originate from `path`.
    ///
    /// Chunks without a usable `title` are submitted under `fallback_title`.
    /// Stream items that are errors count as failed chunks. When such an error
    /// is the last item, the source stopped on it (a malformed row, say) and
    /// the whole file is reported as failed.
    pub async fn push<I, E>(
        &self,
        path: &Path,
        fallback_title: &str,
        chunks: I,
    ) -> Result<PushReport, PushError>
    where
        I: IntoIterator<Item = Result<Chunk, E>>,
        E: StdError + Send + Sync + 'static,
    {
        let origin = path.display().to_string();
        self.observer.on_event(&ProgressEvent::FileStarted { path });

        let mut report = PushReport::default();
        let mut trailing_input_error = None;
        for (ordinal, item) in (1u64..).zip(chunks) {
            let failure = match item {
                Ok(chunk) => {
                    let submission = chunk.into_submission(fallback_title);
                    self.pace().await;
                    let result = self.sink.submit(&submission).await;
                    self.mark_submitted();
                    match result {
                        Ok(_) => {
                            trailing_input_error = None;
                            report.submitted += 1;
                            self.observer.on_event(&ProgressEvent::ChunkSubmitted {
                                source: &origin,
                                ordinal,
                            });
                            continue;
                        }
                        Err(source) => PushError::Submit {
                            origin: origin.clone(),
                            ordinal,
                            source,
                        },
                    }
                }
                Err(e) => PushError::Input {
                    origin: origin.clone(),
                    ordinal,
                    source: Box::new(e),
                },
            };

            report.failed += 1;
            self.observer.on_event(&ProgressEvent::ChunkFailed {
                source: &origin,
                ordinal,
                error: &failure,
            });
            if self.policy.stops_on_failure() {
                self.observer.on_event(&ProgressEvent::FileFailed {
                    path,
                    error: &failure,
                });
                return Err(failure);
            }
            trailing_input_error = match failure {
                PushError::Input { .. } => Some(failure),
                PushError::Submit { .. } => None,
            };
        }

        if let Some(error) = trailing_input_error {
            report.files_failed += 1;
            self.observer.on_event(&ProgressEvent::FileFailed {
                path,
                error: &error,
            });
            return Ok(report);
        }

        self.observer.on_event(&ProgressEvent::FileFinished {
            path,
            chunks: report.submitted,
        });
        Ok(report)
    }

    async fn pace(&self) {
        if self.pacing.is_zero() {
            return;
        }
        let last = *self
            .last_submit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(last) = last {
            tokio::time::sleep_until(last + self.pacing).await;
        }
    }

    fn mark_submitted(&self) {
        *self
            .last_submit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use kbprep_core::{Metadata, Submission};

    use super::*;
    use crate::traits::SubmitReceipt;

    /// Records submissions; fails the calls whose 1-based number is in `fail_on`.
    #[derive(Default)]
    struct FakeSink {
        calls: AtomicU64,
        fail_on: Vec<u64>,
        received: Mutex<Vec<Submission>>,
    }

    impl FakeSink {
        fn failing_on(fail_on: Vec<u64>) -> Self {
            Self {
                fail_on,
                ..Self::default()
            }
        }

        fn titles(&self) -> Vec<String> {
            self.received
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.title.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Sink for FakeSink {
        async fn submit(&self, submission: &Submission) -> Result<SubmitReceipt, SinkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.received.lock().unwrap().push(submission.clone());
            if self.fail_on.contains(&call) {
                return Err(SinkError::Api {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(SubmitReceipt {
                document_id: Some(format!("doc-{call}")),
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("bad line")]
    struct BadLine;

    fn chunk(title: &str, text: &str) -> Result<Chunk, BadLine> {
        let mut metadata = Metadata::new();
        if !title.is_empty() {
            metadata.insert("title".into(), title.into());
        }
        Ok(Chunk::new(metadata, text))
    }

    #[tokio::test]
    async fn submits_each_chunk_once_in_order() {
        let sink = FakeSink::default();
        let pusher = Pusher::new(&sink);
        let chunks = vec![chunk("A", "one"), chunk("A", "two"), chunk("B", "three")];

        let report = pusher
            .push(Path::new("out/doc.jsonl"), "doc", chunks)
            .await
            .unwrap();

        assert_eq!(report, PushReport { submitted: 3, ..PushReport::default() });
        let texts: Vec<String> = sink
            .received
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.text.clone())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn untitled_chunks_use_fallback_title() {
        let sink = FakeSink::default();
        let pusher = Pusher::new(&sink);
        pusher
            .push(Path::new("faq.jsonl"), "faq", vec![chunk("", "x"), chunk("Named", "y")])
            .await
            .unwrap();
        assert_eq!(sink.titles(), vec!["faq", "Named"]);
    }

    #[tokio::test]
    async fn continue_policy_reports_and_keeps_going() {
        let sink = FakeSink::failing_on(vec![2]);
        let pusher = Pusher::new(&sink).with_policy(FailurePolicy::Continue);
        let chunks = vec![chunk("t", "1"), chunk("t", "2"), chunk("t", "3")];

        let report = pusher.push(Path::new("a.jsonl"), "a", chunks).await.unwrap();
        assert_eq!((report.submitted, report.failed, report.files_failed), (2, 1, 0));
        assert!(!report.is_success());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fail_fast_stops_at_first_failure() {
        let sink = FakeSink::failing_on(vec![2]);
        let pusher = Pusher::new(&sink).with_policy(FailurePolicy::FailFast);
        let chunks = vec![chunk("t", "1"), chunk("t", "2"), chunk("t", "3")];

        let err = pusher
            .push(Path::new("a.jsonl"), "a", chunks)
            .await
            .unwrap_err();
        match err {
            PushError::Submit { ordinal, .. } => assert_eq!(ordinal, 2),
            other => panic!("expected Submit error, got: {other:?}"),
        }
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Observer for Recorder {
        fn on_event(&self, event: &ProgressEvent<'_>) {
            let name = match event {
                ProgressEvent::FileStarted { .. } => "start".to_string(),
                ProgressEvent::FileFinished { chunks, .. } => format!("done {chunks}"),
                ProgressEvent::FileFailed { .. } => "file-failed".to_string(),
                ProgressEvent::ChunkSubmitted { ordinal, .. } => format!("ok #{ordinal}"),
                ProgressEvent::ChunkFailed { ordinal, .. } => format!("failed #{ordinal}"),
                ProgressEvent::NoInput { .. } | ProgressEvent::ArtifactOverwritten { .. } => {
                    "other".to_string()
                }
            };
            self.events.lock().unwrap().push(name);
        }
    }

    #[tokio::test]
    async fn unreadable_items_count_as_failures() {
        let sink = FakeSink::default();
        let recorder = Recorder::default();
        let pusher = Pusher::new(&sink).with_observer(&recorder);
        let chunks = vec![chunk("t", "1"), Err(BadLine), chunk("t", "3")];

        let report = pusher.push(Path::new("a.jsonl"), "a", chunks).await.unwrap();
        assert_eq!((report.submitted, report.failed, report.files_failed), (2, 1, 0));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start", "ok #1", "failed #2", "ok #3", "done 2"]
        );
    }

    #[tokio::test]
    async fn stream_ending_on_unreadable_item_fails_the_file() {
        let sink = FakeSink::default();
        let recorder = Recorder::default();
        let pusher = Pusher::new(&sink).with_observer(&recorder);
        let chunks = vec![chunk("t", "1"), Err(BadLine)];

        let report = pusher.push(Path::new("rows.csv"), "rows", chunks).await.unwrap();
        assert_eq!((report.submitted, report.failed, report.files_failed), (1, 1, 1));
        assert!(!report.is_success());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start", "ok #1", "failed #2", "file-failed"]
        );
    }

    #[tokio::test]
    async fn trailing_sink_failure_does_not_fail_the_file() {
        let sink = FakeSink::failing_on(vec![2]);
        let recorder = Recorder::default();
        let pusher = Pusher::new(&sink).with_observer(&recorder);

        let report = pusher
            .push(Path::new("a.jsonl"), "a", vec![chunk("t", "1"), chunk("t", "2")])
            .await
            .unwrap();
        assert_eq!(report.files_failed, 0);
        assert_eq!(recorder.events.lock().unwrap().last().unwrap(), "done 1");
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_out_submissions() {
        let sink = FakeSink::default();
        let pusher = Pusher::new(&sink).with_pacing(Duration::from_millis(200));
        let started = Instant::now();

        pusher
            .push(Path::new("a.jsonl"), "a", vec![chunk("t", "1"), chunk("t", "2")])
            .await
            .unwrap();
        pusher
            .push(Path::new("b.jsonl"), "b", vec![chunk("t", "3")])
            .await
            .unwrap();

        // Two gaps between three submissions, none before the first.
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert!(started.elapsed() < Duration::from_millis(600));
    }

    #[test]
    fn reports_merge() {
        let mut total = PushReport::default();
        total.merge(PushReport {
            submitted: 3,
            failed: 1,
            files_failed: 0,
        });
        total.merge(PushReport {
            submitted: 2,
            failed: 0,
            files_failed: 1,
        });
        assert_eq!(
            total,
            PushReport {
                submitted: 5,
                failed: 1,
                files_failed: 1,
            }
        );
    }
}
