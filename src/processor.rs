//! Image processor boundary
//!
//! The background-removal model is an external collaborator: given a model
//! artifact, an input image and an output directory it either produces a
//! processed file or fails. This module defines that boundary as a trait,
//! an adapter that shells out to an external executable, and a mock
//! implementation for testing without a real model.

use crate::error::{AbgRemovalError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

/// Suffix appended to an input file's stem to name its processed output
pub const OUTPUT_SUFFIX: &str = "_nobg";

/// The opaque background-removal operation
///
/// Implementations are invoked from the worker's blocking context and may be
/// arbitrarily slow. `output_dir` of `None` means "write beside the input
/// file". Failure semantics are opaque beyond "did not produce output"; the
/// worker treats a failed item as skippable.
pub trait ImageProcessor: Send + Sync {
    /// Process a single input image, returning the path of the produced file
    fn process(&self, model_path: &Path, input: &Path, output_dir: Option<&Path>)
        -> Result<PathBuf>;
}

/// Compute the output path for an input file
///
/// The output keeps the input's file stem with [`OUTPUT_SUFFIX`] appended and
/// a `.png` extension, placed in `output_dir` when given, otherwise next to
/// the input.
#[must_use]
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy().into_owned());
    let file_name = format!("{stem}{OUTPUT_SUFFIX}.png");
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Adapter that runs background removal through an external executable
///
/// The executable is invoked as `<program> <model> <input> <output>` and is
/// expected to write the output file itself, mirroring how the desktop
/// application bundles the model runner as a separate artifact.
pub struct ExternalCommandProcessor {
    program: PathBuf,
}

impl ExternalCommandProcessor {
    /// Create an adapter for the given executable
    #[must_use]
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ImageProcessor for ExternalCommandProcessor {
    fn process(
        &self,
        model_path: &Path,
        input: &Path,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let output = output_path_for(input, output_dir);
        let status = Command::new(&self.program)
            .arg(model_path)
            .arg(input)
            .arg(&output)
            .status()
            .map_err(|e| {
                AbgRemovalError::item_failed(input, &format!("failed to launch model runner: {e}"))
            })?;

        if !status.success() {
            return Err(AbgRemovalError::item_failed(
                input,
                &format!("model runner exited with {status}"),
            ));
        }
        if !output.is_file() {
            return Err(AbgRemovalError::item_failed(
                input,
                "model runner reported success but produced no output",
            ));
        }
        Ok(output)
    }
}

/// Mock processor for testing without a real model
///
/// Records every input it is asked to process, optionally fails for selected
/// file names, optionally sleeps to simulate slow inference, and writes a
/// stub output file so callers can verify placement.
#[derive(Default)]
pub struct MockProcessor {
    calls: Mutex<Vec<PathBuf>>,
    fail_on: Vec<String>,
    delay: Option<Duration>,
}

impl MockProcessor {
    /// Create a mock that succeeds for every input
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail for inputs whose file name matches any of the given names
    #[must_use]
    pub fn failing_on<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fail_on: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sleep for `delay` on every call to simulate slow inference
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Inputs processed so far, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }
}

impl ImageProcessor for MockProcessor {
    fn process(
        &self,
        _model_path: &Path,
        input: &Path,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(input.to_path_buf());

        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_on.iter().any(|n| *n == file_name) {
            return Err(AbgRemovalError::item_failed(input, "mock failure"));
        }

        let output = output_path_for(input, output_dir);
        std::fs::write(&output, b"mock output")
            .map_err(|e| AbgRemovalError::item_failed(input, &e.to_string()))?;
        Ok(output)
    }
}
