//! Progress reporting for batch operations
//!
//! This module separates progress reporting concerns from the worker's
//! processing loop, allowing different frontends to implement their own
//! progress handling. Reporters are called synchronously from the worker's
//! execution context in emission order, so implementations must be cheap and
//! must never block for long.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Interim progress percentage after `completed` of `total` items
///
/// The scale intentionally caps interim progress at 99 so that 100 is
/// reserved exclusively for true completion: `floor(completed / total * 99)`.
#[must_use]
pub fn interim_progress(completed: usize, total: usize) -> u8 {
    debug_assert!(total > 0 && completed <= total);
    ((completed * 99) / total) as u8
}

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOutcome {
    /// Every item was attempted; `failed` of them did not produce output
    Completed {
        /// Items attempted (successes and failures)
        processed: usize,
        /// Items that failed processing
        failed: usize,
    },
    /// The run was stopped cooperatively before exhausting the queue
    Cancelled {
        /// Items attempted before the stop was observed
        processed: usize,
        /// Items that failed processing
        failed: usize,
    },
}

/// A single item that failed to process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Input path of the failed item
    pub path: PathBuf,
    /// Error description
    pub error: String,
}

/// Final accounting for a batch run, returned by the worker's `join`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Items attempted (successes and failures)
    pub processed: usize,
    /// Per-item failures, in the order they occurred
    pub failures: Vec<FailedItem>,
    /// Whether the run was cancelled before exhausting the queue
    pub cancelled: bool,
}

impl BatchSummary {
    /// The terminal outcome corresponding to this summary
    #[must_use]
    pub fn outcome(&self) -> BatchOutcome {
        if self.cancelled {
            BatchOutcome::Cancelled {
                processed: self.processed,
                failed: self.failures.len(),
            }
        } else {
            BatchOutcome::Completed {
                processed: self.processed,
                failed: self.failures.len(),
            }
        }
    }
}

/// Trait for observing batch progress
///
/// Progress values are monotonically non-decreasing within a run, bounded in
/// [0,100], and 100 is emitted at most once, only on true completion. A
/// cancelled run emits no further progress values; the terminal
/// [`BatchOutcome::Cancelled`] is the only signal it ended.
pub trait BatchProgressReporter: Send + Sync {
    /// Report a new progress percentage (0-100)
    fn on_progress(&self, percent: u8);

    /// Report that a single item failed; the batch continues
    fn on_item_failed(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Report that the run reached its terminal state
    fn on_finished(&self, outcome: &BatchOutcome) {
        let _ = outcome;
    }
}

/// No-op progress reporter that discards all updates
pub struct NoOpProgressReporter;

impl BatchProgressReporter for NoOpProgressReporter {
    fn on_progress(&self, _percent: u8) {
        // Intentionally empty - discards progress updates
    }
}

/// Console progress reporter that logs updates through `tracing`
pub struct ConsoleProgressReporter;

impl BatchProgressReporter for ConsoleProgressReporter {
    fn on_progress(&self, percent: u8) {
        tracing::info!("[{}%] processing batch", percent);
    }

    fn on_item_failed(&self, path: &Path, error: &str) {
        tracing::warn!("failed to process {}: {}", path.display(), error);
    }

    fn on_finished(&self, outcome: &BatchOutcome) {
        match outcome {
            BatchOutcome::Completed { processed, failed } => {
                tracing::info!("batch complete: {} processed, {} failed", processed, failed);
            },
            BatchOutcome::Cancelled { processed, failed } => {
                tracing::info!(
                    "batch cancelled after {} item(s), {} failed",
                    processed,
                    failed
                );
            },
        }
    }
}

/// A progress event forwarded over a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// New progress percentage
    Progress(u8),
    /// An item failed; the batch continues
    ItemFailed {
        /// Input path of the failed item
        path: PathBuf,
        /// Error description
        error: String,
    },
    /// The run reached its terminal state
    Finished(BatchOutcome),
}

/// Reporter that forwards events over an unbounded channel
///
/// The sender side never blocks, so a slow consumer cannot stall the worker.
/// Emission order is preserved. Events are silently dropped once the receiver
/// is gone; a closed observer is not a worker error.
pub struct ChannelProgressReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressReporter {
    /// Create a reporter and the receiving half of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl BatchProgressReporter for ChannelProgressReporter {
    fn on_progress(&self, percent: u8) {
        let _ = self.tx.send(ProgressEvent::Progress(percent));
    }

    fn on_item_failed(&self, path: &Path, error: &str) {
        let _ = self.tx.send(ProgressEvent::ItemFailed {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn on_finished(&self, outcome: &BatchOutcome) {
        let _ = self.tx.send(ProgressEvent::Finished(outcome.clone()));
    }
}

/// Reporter that records every event for later inspection in tests
#[derive(Default)]
pub struct RecordingProgressReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressReporter {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, in emission order
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }

    /// Only the progress percentages, in emission order
    pub fn percentages(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: ProgressEvent) {
        self.events.lock().expect("event log poisoned").push(event);
    }
}

impl BatchProgressReporter for RecordingProgressReporter {
    fn on_progress(&self, percent: u8) {
        self.record(ProgressEvent::Progress(percent));
    }

    fn on_item_failed(&self, path: &Path, error: &str) {
        self.record(ProgressEvent::ItemFailed {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn on_finished(&self, outcome: &BatchOutcome) {
        self.record(ProgressEvent::Finished(outcome.clone()));
    }
}
