//! Batch controller
//!
//! [`BatchController`] is the top-level orchestration: it turns a raw file
//! selection into a confirmed [`Batch`] and drives one worker/observer pair
//! per batch. The model artifact is verified once, at construction; a
//! missing model disables all processing entry points for the lifetime of
//! the controller.

use crate::batch::{Batch, OutputLocation};
use crate::error::{AbgRemovalError, Result};
use crate::observer::{DisplayReporter, ProgressSession};
use crate::ports::{ConfirmationPort, ProgressDisplay};
use crate::processor::ImageProcessor;
use crate::settings::{keys, SettingsStore};
use crate::worker::BatchWorker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// File extension accepted when filtering a dropped selection
pub const KNOWN_EXTENSION: &str = "png";

/// Top-level orchestration for batch submissions
pub struct BatchController {
    model_path: PathBuf,
    processor: Arc<dyn ImageProcessor>,
    settings: Arc<dyn SettingsStore>,
    confirm: Arc<dyn ConfirmationPort>,
}

impl BatchController {
    /// Create a controller, verifying the model artifact up front
    ///
    /// Returns [`AbgRemovalError::ModelMissing`] when the artifact is absent;
    /// this is the application's fatal configuration error and is surfaced
    /// once, before any batch may be submitted.
    pub fn new(
        model_path: PathBuf,
        processor: Arc<dyn ImageProcessor>,
        settings: Arc<dyn SettingsStore>,
        confirm: Arc<dyn ConfirmationPort>,
    ) -> Result<Self> {
        if !model_path.is_file() {
            return Err(AbgRemovalError::ModelMissing(model_path));
        }
        info!("using model artifact at {}", model_path.display());
        Ok(Self {
            model_path,
            processor,
            settings,
            confirm,
        })
    }

    /// Path of the verified model artifact
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// The currently configured output location
    #[must_use]
    pub fn output_location(&self) -> OutputLocation {
        OutputLocation::from_setting(&self.settings.get(keys::SAVE_LOCATION, ""))
    }

    /// Submit a file selection for processing
    ///
    /// With `filter_to_known_extension` the selection is reduced to files
    /// matching [`KNOWN_EXTENSION`] before anything else happens (drag-and-
    /// drop hands over arbitrary files). An empty selection, an empty
    /// filtered set, or a declined confirmation are all no-ops returning
    /// `Ok(None)`: no prompt for zero items and no worker is constructed.
    ///
    /// On an affirmative confirmation a worker/observer pair is created over
    /// the accepted files and started; the returned session is the caller's
    /// handle on the running batch.
    pub fn submit_files(
        &self,
        paths: &[PathBuf],
        filter_to_known_extension: bool,
        display: Arc<dyn ProgressDisplay>,
    ) -> Result<Option<ProgressSession>> {
        if paths.is_empty() {
            debug!("empty selection; nothing to submit");
            return Ok(None);
        }

        let accepted: Vec<PathBuf> = if filter_to_known_extension {
            paths
                .iter()
                .filter(|p| has_known_extension(p))
                .cloned()
                .collect()
        } else {
            paths.to_vec()
        };

        if accepted.is_empty() {
            info!(
                "none of the {} selected file(s) match .{}; nothing to do",
                paths.len(),
                KNOWN_EXTENSION
            );
            return Ok(None);
        }

        // The prompt discloses the filtering whenever anything was rejected
        let prompt = if accepted.len() == paths.len() {
            format!(
                "{} image(s) will be processed. Do you want to proceed?",
                accepted.len()
            )
        } else {
            format!(
                "Selected {} file(s); only the {} PNG file(s) among them will be processed. \
                 Do you want to continue?",
                paths.len(),
                accepted.len()
            )
        };

        if !self.confirm.confirm(&prompt) {
            info!("batch declined by user");
            return Ok(None);
        }

        let batch = Batch::new(accepted, self.output_location())?;
        info!("starting batch of {} item(s)", batch.len());

        let worker = BatchWorker::new(
            batch,
            self.model_path.clone(),
            Arc::clone(&self.processor),
            Arc::new(DisplayReporter::new(Arc::clone(&display))),
        );
        let mut session = ProgressSession::new(worker, display, Arc::clone(&self.confirm));
        session.start()?;
        Ok(Some(session))
    }
}

fn has_known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(KNOWN_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AutoConfirm, NullDisplay, RecordingDisplay};
    use crate::processor::MockProcessor;
    use crate::settings::MemorySettingsStore;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        model: PathBuf,
        processor: Arc<MockProcessor>,
        confirm: Arc<AutoConfirm>,
    }

    impl Fixture {
        fn new(answer: bool) -> Self {
            let dir = TempDir::new().expect("tempdir");
            let model = dir.path().join("isnetis.onnx");
            fs::write(&model, b"model").expect("fixture");
            Self {
                dir,
                model,
                processor: Arc::new(MockProcessor::new()),
                confirm: Arc::new(AutoConfirm::new(answer)),
            }
        }

        fn controller(&self) -> BatchController {
            BatchController::new(
                self.model.clone(),
                Arc::clone(&self.processor) as Arc<dyn ImageProcessor>,
                Arc::new(MemorySettingsStore::new()),
                Arc::clone(&self.confirm) as Arc<dyn ConfirmationPort>,
            )
            .expect("model present")
        }

        fn touch(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, b"data").expect("fixture");
            path
        }
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let result = BatchController::new(
            dir.path().join("missing.onnx"),
            Arc::new(MockProcessor::new()),
            Arc::new(MemorySettingsStore::new()),
            Arc::new(AutoConfirm::new(true)),
        );
        assert!(matches!(result, Err(AbgRemovalError::ModelMissing(_))));
    }

    #[tokio::test]
    async fn test_empty_selection_is_a_noop() {
        let fixture = Fixture::new(true);
        let controller = fixture.controller();

        let session = controller
            .submit_files(&[], true, Arc::new(NullDisplay))
            .expect("submit");
        assert!(session.is_none());
        assert!(fixture.confirm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_filter_to_empty_set_skips_prompt() {
        let fixture = Fixture::new(true);
        let controller = fixture.controller();
        let jpg = fixture.touch("photo.jpg");

        let session = controller
            .submit_files(&[jpg], true, Arc::new(NullDisplay))
            .expect("submit");
        assert!(session.is_none());
        assert!(fixture.confirm.prompts().is_empty());
        assert!(fixture.processor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_filtering_reduces_batch_and_discloses_counts() {
        let fixture = Fixture::new(true);
        let controller = fixture.controller();
        let png = fixture.touch("a.png");
        let upper = fixture.touch("b.PNG");
        let jpg = fixture.touch("c.jpg");

        let mut session = controller
            .submit_files(&[png.clone(), upper.clone(), jpg], true, Arc::new(NullDisplay))
            .expect("submit")
            .expect("worker should start");
        session.wait().await.expect("finish");

        // Case-insensitive extension match; the jpg is rejected
        assert_eq!(fixture.processor.calls(), vec![png, upper]);

        let prompts = fixture.confirm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("3 file(s)"));
        assert!(prompts[0].contains("2 PNG file(s)"));
    }

    #[tokio::test]
    async fn test_unfiltered_prompt_uses_plain_count() {
        let fixture = Fixture::new(true);
        let controller = fixture.controller();
        let a = fixture.touch("a.png");
        let b = fixture.touch("b.png");

        let mut session = controller
            .submit_files(&[a, b], false, Arc::new(NullDisplay))
            .expect("submit")
            .expect("worker should start");
        session.wait().await.expect("finish");

        let prompts = fixture.confirm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("2 image(s) will be processed"));
        assert!(!prompts[0].contains("PNG"));
    }

    #[tokio::test]
    async fn test_declined_confirmation_creates_no_worker() {
        let fixture = Fixture::new(false);
        let controller = fixture.controller();
        let a = fixture.touch("a.png");

        let session = controller
            .submit_files(&[a], false, Arc::new(NullDisplay))
            .expect("submit");
        assert!(session.is_none());
        assert_eq!(fixture.confirm.prompts().len(), 1);
        assert!(fixture.processor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_save_location_setting_routes_output() {
        let fixture = Fixture::new(true);
        let out_dir = TempDir::new().expect("tempdir");
        let controller = BatchController::new(
            fixture.model.clone(),
            Arc::clone(&fixture.processor) as Arc<dyn ImageProcessor>,
            Arc::new(MemorySettingsStore::with_save_location(out_dir.path())),
            Arc::clone(&fixture.confirm) as Arc<dyn ConfirmationPort>,
        )
        .expect("model present");
        let a = fixture.touch("a.png");

        let display = Arc::new(RecordingDisplay::new());
        let mut session = controller
            .submit_files(&[a], false, display.clone())
            .expect("submit")
            .expect("worker should start");
        let summary = session.join(Duration::from_secs(10)).await.expect("finish");

        assert_eq!(summary.processed, 1);
        assert!(out_dir.path().join("a_nobg.png").is_file());
        assert_eq!(display.values(), vec![0, 100]);
    }
}
