//! Progress session
//!
//! [`ProgressSession`] is the foreground half of a batch run: it binds worker
//! progress events to a [`ProgressDisplay`] and mediates user cancellation.
//! Closing the surrounding window while the worker is running requires an
//! explicit confirmation, after which the worker is stopped cooperatively and
//! given a bounded grace period to wind down.

use crate::error::Result;
use crate::ports::{ConfirmationPort, ProgressDisplay};
use crate::progress::{BatchOutcome, BatchProgressReporter, BatchSummary};
use crate::worker::{BatchWorker, StopHandle, WorkerState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Grace period granted to the worker during a confirmed cancel-and-close
///
/// Shutdown is best-effort: if the worker is still processing an item when
/// the period elapses, it is left to finish in the background rather than
/// killed.
pub const CLOSE_JOIN_TIMEOUT: Duration = Duration::from_millis(3000);

/// Prompt shown when the user tries to close a running session
pub const STOP_PROMPT: &str = "Do you really want to stop the operation?";

/// Outcome of a close request
#[derive(Debug)]
pub enum CloseDecision {
    /// The session may close; the summary is present if the worker wound
    /// down within the grace period
    Closed(Option<BatchSummary>),
    /// The user declined to stop a running batch; the close is cancelled
    KeptOpen,
}

/// Reporter that renders progress onto a [`ProgressDisplay`]
///
/// Renders "{percent}%" labels and enables the close action only once 100 is
/// observed, i.e. only on true completion.
pub struct DisplayReporter {
    display: Arc<dyn ProgressDisplay>,
}

impl DisplayReporter {
    /// Bind a display
    #[must_use]
    pub fn new(display: Arc<dyn ProgressDisplay>) -> Self {
        Self { display }
    }
}

impl BatchProgressReporter for DisplayReporter {
    fn on_progress(&self, percent: u8) {
        self.display.set_value(percent);
        self.display.set_label(&format!("{percent}%"));
        if percent >= 100 {
            self.display.set_close_enabled(true);
        }
    }

    fn on_item_failed(&self, path: &Path, error: &str) {
        tracing::warn!("failed to process {}: {}", path.display(), error);
    }

    fn on_finished(&self, outcome: &BatchOutcome) {
        // A cancelled run never reaches 100; unlock the close action so the
        // session can be dismissed once the worker has wound down.
        if matches!(outcome, BatchOutcome::Cancelled { .. }) {
            self.display.set_close_enabled(true);
        }
    }
}

/// Foreground observer for a single batch run
pub struct ProgressSession {
    worker: BatchWorker,
    display: Arc<dyn ProgressDisplay>,
    confirm: Arc<dyn ConfirmationPort>,
}

impl ProgressSession {
    /// Create a session around an idle worker
    ///
    /// The worker should have been constructed with a [`DisplayReporter`]
    /// over the same display so that progress events reach it.
    #[must_use]
    pub fn new(
        worker: BatchWorker,
        display: Arc<dyn ProgressDisplay>,
        confirm: Arc<dyn ConfirmationPort>,
    ) -> Self {
        Self {
            worker,
            display,
            confirm,
        }
    }

    /// Reset the display and start the worker
    pub fn start(&mut self) -> Result<()> {
        self.display.set_close_enabled(false);
        self.display.set_value(0);
        self.display.set_label("Loading...");
        self.worker.start()
    }

    /// Current worker state
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Handle for requesting cancellation from another execution context
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.worker.stop_handle()
    }

    /// Wait without a timeout for the worker to finish
    pub async fn wait(&mut self) -> Option<BatchSummary> {
        self.worker.wait().await
    }

    /// Bounded wait for the worker to finish
    pub async fn join(&mut self, timeout: Duration) -> Option<BatchSummary> {
        self.worker.join(timeout).await
    }

    /// Handle a close/cancel request from the user
    ///
    /// While the worker is running this asks for confirmation; declining
    /// cancels the close. Confirming requests a cooperative stop and waits
    /// up to [`CLOSE_JOIN_TIMEOUT`] for the worker to wind down. Once the
    /// worker is stopped (or was never started), closing is unconditional.
    pub async fn request_close(&mut self) -> CloseDecision {
        if self.worker.state() == WorkerState::Running {
            if !self.confirm.confirm(STOP_PROMPT) {
                return CloseDecision::KeptOpen;
            }
            self.worker.request_stop();
        }
        let summary = self.worker.join(CLOSE_JOIN_TIMEOUT).await;
        CloseDecision::Closed(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Batch, OutputLocation};
    use crate::ports::{AutoConfirm, RecordingDisplay};
    use crate::processor::MockProcessor;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session_over(
        dir: &TempDir,
        names: &[&str],
        processor: Arc<MockProcessor>,
        display: Arc<RecordingDisplay>,
        confirm: Arc<AutoConfirm>,
    ) -> ProgressSession {
        let items: Vec<PathBuf> = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, b"png").expect("fixture");
                path
            })
            .collect();
        let batch = Batch::new(items, OutputLocation::BesideInput).expect("valid batch");
        let worker = BatchWorker::new(
            batch,
            PathBuf::from("/model/isnetis.onnx"),
            processor,
            Arc::new(DisplayReporter::new(
                Arc::clone(&display) as Arc<dyn crate::ports::ProgressDisplay>
            )),
        );
        ProgressSession::new(worker, display, confirm)
    }

    #[tokio::test]
    async fn test_display_reflects_progress_and_completion() {
        let dir = TempDir::new().expect("tempdir");
        let display = Arc::new(RecordingDisplay::new());
        let confirm = Arc::new(AutoConfirm::new(true));
        let mut session = session_over(
            &dir,
            &["a.png", "b.png", "c.png"],
            Arc::new(MockProcessor::new()),
            Arc::clone(&display),
            confirm,
        );

        session.start().expect("start");
        let summary = session.wait().await.expect("finish");

        assert_eq!(summary.processed, 3);
        assert_eq!(display.values(), vec![0, 33, 66, 100]);
        let labels = display.labels();
        assert_eq!(labels.first().map(String::as_str), Some("Loading..."));
        assert_eq!(labels.last().map(String::as_str), Some("100%"));
        // Close is locked until 100 is observed
        assert_eq!(display.close_enabled_history().first(), Some(&false));
        assert!(display.close_enabled());
    }

    #[tokio::test]
    async fn test_declined_close_keeps_session_open() {
        let dir = TempDir::new().expect("tempdir");
        let display = Arc::new(RecordingDisplay::new());
        let confirm = Arc::new(AutoConfirm::new(false));
        let mut session = session_over(
            &dir,
            &["a.png", "b.png"],
            Arc::new(MockProcessor::new().with_delay(Duration::from_millis(200))),
            display,
            Arc::clone(&confirm),
        );

        session.start().expect("start");
        assert_eq!(session.worker_state(), WorkerState::Running);

        let decision = session.request_close().await;
        assert!(matches!(decision, CloseDecision::KeptOpen));
        assert_eq!(confirm.prompts(), vec![STOP_PROMPT]);

        // The run is unaffected by the declined close
        let summary = session.wait().await.expect("finish");
        assert!(!summary.cancelled);
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn test_confirmed_close_stops_and_joins() {
        let dir = TempDir::new().expect("tempdir");
        let display = Arc::new(RecordingDisplay::new());
        let confirm = Arc::new(AutoConfirm::new(true));
        let mut session = session_over(
            &dir,
            &["a.png", "b.png", "c.png"],
            Arc::new(MockProcessor::new().with_delay(Duration::from_millis(100))),
            Arc::clone(&display),
            Arc::clone(&confirm),
        );

        session.start().expect("start");
        let decision = session.request_close().await;

        match decision {
            CloseDecision::Closed(Some(summary)) => {
                assert!(summary.cancelled);
                assert!(summary.processed < 3);
            },
            other => panic!("expected a closed session with summary, got {other:?}"),
        }
        assert_eq!(confirm.prompts(), vec![STOP_PROMPT]);
        assert_eq!(session.worker_state(), WorkerState::Stopped);
        // Cancelled runs never render 100
        assert!(!display.values().contains(&100));
    }

    #[tokio::test]
    async fn test_close_after_completion_needs_no_confirmation() {
        let dir = TempDir::new().expect("tempdir");
        let display = Arc::new(RecordingDisplay::new());
        let confirm = Arc::new(AutoConfirm::new(false));
        let mut session = session_over(
            &dir,
            &["a.png"],
            Arc::new(MockProcessor::new()),
            display,
            Arc::clone(&confirm),
        );

        session.start().expect("start");
        session.wait().await.expect("finish");

        // Worker already stopped: no prompt, close unconditionally
        let decision = session.request_close().await;
        assert!(matches!(decision, CloseDecision::Closed(_)));
        assert!(confirm.prompts().is_empty());
    }
}
