//! Batch worker
//!
//! [`BatchWorker`] drains a [`Batch`] one item at a time on a dedicated
//! blocking execution context, reporting progress to a
//! [`BatchProgressReporter`] and honoring cooperative cancellation between
//! items. A worker is single-use: once it reaches [`WorkerState::Stopped`]
//! it is never restarted.

use crate::batch::{Batch, OutputLocation};
use crate::error::{AbgRemovalError, Result};
use crate::processor::ImageProcessor;
use crate::progress::{interim_progress, BatchProgressReporter, BatchSummary, FailedItem};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a [`BatchWorker`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Created, not yet started
    Idle = 0,
    /// Processing loop is running
    Running = 1,
    /// An external stop was requested; observed cooperatively between items
    StopRequested = 2,
    /// Processing loop has exited; terminal, the worker is never restarted
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

/// Cloneable handle for requesting cancellation from another execution context
///
/// Setting the stop flag never blocks and never interrupts the item currently
/// being processed; it only prevents the next item from starting.
#[derive(Clone)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
}

impl StopHandle {
    /// Request a cooperative stop
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Record the request in the lifecycle state; the loop moves it to
        // Stopped once it observes the flag.
        if self
            .state
            .compare_exchange(
                WorkerState::Running as u8,
                WorkerState::StopRequested as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            let _ = self.state.compare_exchange(
                WorkerState::Idle as u8,
                WorkerState::StopRequested as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
    }
}

/// Sequentially processes a batch on a dedicated blocking task
pub struct BatchWorker {
    batch: Batch,
    model_path: PathBuf,
    processor: Arc<dyn ImageProcessor>,
    reporter: Arc<dyn BatchProgressReporter>,
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<BatchSummary>>,
}

impl BatchWorker {
    /// Create an idle worker over a batch
    ///
    /// The batch and its output location are read-only from here on; the
    /// stop flag is the only datum mutated across execution contexts.
    #[must_use]
    pub fn new(
        batch: Batch,
        model_path: PathBuf,
        processor: Arc<dyn ImageProcessor>,
        reporter: Arc<dyn BatchProgressReporter>,
    ) -> Self {
        Self {
            batch,
            model_path,
            processor,
            reporter,
            stop: Arc::new(AtomicBool::new(false)),
            state: Arc::new(AtomicU8::new(WorkerState::Idle as u8)),
            handle: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// The batch this worker was constructed over
    #[must_use]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Handle for requesting cancellation from another execution context
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
            state: Arc::clone(&self.state),
        }
    }

    /// Request a cooperative stop
    ///
    /// Does not block and does not interrupt the item currently in flight;
    /// the next item is skipped instead. May be called before `start()`, in
    /// which case the loop exits before processing anything.
    pub fn request_stop(&self) {
        self.stop_handle().request_stop();
    }

    /// Begin processing on a dedicated blocking task
    ///
    /// Returns promptly; actual processing happens concurrently. Erroring on
    /// a second call: a worker is single-use.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() || self.state() == WorkerState::Stopped {
            return Err(AbgRemovalError::invalid_config(
                "batch worker is single-use and was already started",
            ));
        }
        // Leave the state alone if a stop raced in before the start; the
        // loop observes the flag before touching the first item.
        let _ = self.state.compare_exchange(
            WorkerState::Idle as u8,
            WorkerState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let items = self.batch.items().to_vec();
        let output = self.batch.output().clone();
        let model_path = self.model_path.clone();
        let processor = Arc::clone(&self.processor);
        let reporter = Arc::clone(&self.reporter);
        let stop = Arc::clone(&self.stop);
        let state = Arc::clone(&self.state);

        self.handle = Some(tokio::task::spawn_blocking(move || {
            run_loop(
                &items,
                &output,
                &model_path,
                processor.as_ref(),
                reporter.as_ref(),
                &stop,
                &state,
            )
        }));
        Ok(())
    }

    /// Wait up to `timeout` for the processing task to reach `Stopped`
    ///
    /// Returns the batch summary once the loop has exited. On timeout,
    /// returns `None` without guaranteeing termination: shutdown is
    /// best-effort and a lingering worker past the timeout is tolerated,
    /// not killed. Also returns `None` if the worker was never started.
    pub async fn join(&mut self, timeout: Duration) -> Option<BatchSummary> {
        let handle = self.handle.as_mut()?;
        match tokio::time::timeout(timeout, &mut *handle).await {
            Ok(Ok(summary)) => {
                self.handle = None;
                Some(summary)
            },
            Ok(Err(join_error)) => {
                self.handle = None;
                error!("batch worker task failed: {}", join_error);
                None
            },
            Err(_elapsed) => {
                warn!(
                    "batch worker did not stop within {:?}; leaving it to finish in the background",
                    timeout
                );
                None
            },
        }
    }

    /// Wait without a timeout for the processing task to finish
    ///
    /// Returns `None` if the worker was never started or its task failed.
    pub async fn wait(&mut self) -> Option<BatchSummary> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(summary) => Some(summary),
            Err(join_error) => {
                error!("batch worker task failed: {}", join_error);
                None
            },
        }
    }
}

/// The processing loop, run on the blocking task
///
/// Emits `floor(j / N * 99)` after the j-th of N items and exactly one `100`
/// when the final item completes. A per-item failure is recorded and the
/// loop advances; only the stop flag ends the run early, in which case no
/// further progress value (and never `100`) is emitted.
fn run_loop(
    items: &[PathBuf],
    output: &OutputLocation,
    model_path: &std::path::Path,
    processor: &dyn ImageProcessor,
    reporter: &dyn BatchProgressReporter,
    stop: &AtomicBool,
    state: &AtomicU8,
) -> BatchSummary {
    let total = items.len();
    let mut processed = 0usize;
    let mut failures: Vec<FailedItem> = Vec::new();

    for item in items {
        if stop.load(Ordering::SeqCst) {
            info!(
                "stop requested; cancelling batch after {}/{} item(s)",
                processed, total
            );
            state.store(WorkerState::Stopped as u8, Ordering::SeqCst);
            let summary = BatchSummary {
                processed,
                failures,
                cancelled: true,
            };
            reporter.on_finished(&summary.outcome());
            return summary;
        }

        debug!("processing {}/{}: {}", processed + 1, total, item.display());
        match processor.process(model_path, item, output.as_dir()) {
            Ok(produced) => debug!("wrote {}", produced.display()),
            Err(e) => {
                let message = e.to_string();
                warn!("skipping {}: {}", item.display(), message);
                reporter.on_item_failed(item, &message);
                failures.push(FailedItem {
                    path: item.clone(),
                    error: message,
                });
            },
        }

        processed += 1;
        if processed == total {
            reporter.on_progress(100);
        } else {
            reporter.on_progress(interim_progress(processed, total));
        }
    }

    info!(
        "batch complete: {} item(s) processed, {} failed",
        processed,
        failures.len()
    );
    state.store(WorkerState::Stopped as u8, Ordering::SeqCst);
    let summary = BatchSummary {
        processed,
        failures,
        cancelled: false,
    };
    reporter.on_finished(&summary.outcome());
    summary
}
