#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # ABG Remover batch-processing core
//!
//! The asynchronous batch subsystem behind the ABG Remover desktop utility:
//! a background worker that sequentially runs image files through an
//! external background-removal model, reporting progress to a foreground
//! observer and supporting safe cancellation mid-batch.
//!
//! The windowing toolkit, the file picker and the model itself are external
//! collaborators, reached only through small injected traits
//! ([`ImageProcessor`], [`ConfirmationPort`], [`ProgressDisplay`],
//! [`SettingsStore`]). The crate ships a `clap`/`indicatif` command-line
//! front end behind the default `cli` feature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abgremover::{
//!     AutoConfirm, BatchController, ExternalCommandProcessor, MemorySettingsStore, NullDisplay,
//! };
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> abgremover::Result<()> {
//! // The model artifact is verified once, before any batch may run
//! let controller = BatchController::new(
//!     PathBuf::from("model/isnetis.onnx"),
//!     Arc::new(ExternalCommandProcessor::new("abgr-runner")),
//!     Arc::new(MemorySettingsStore::new()),
//!     Arc::new(AutoConfirm::new(true)),
//! )?;
//!
//! // Submit a selection; filtering keeps only .png files
//! let files = vec![PathBuf::from("/images/a.png"), PathBuf::from("/images/b.png")];
//! if let Some(mut session) = controller.submit_files(&files, true, Arc::new(NullDisplay))? {
//!     let summary = session.wait().await;
//!     println!("{summary:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress contract
//!
//! For a batch of N items the worker emits `floor(j / N * 99)` after the
//! j-th item and exactly one `100` when the final item completes, so interim
//! progress never reaches 100. The worker itself never emits `0`; a display
//! shows `0` at the start of a run only because [`ProgressSession::start`]
//! resets the surface before the worker begins.
//! Cancellation is cooperative and per-item: a
//! stop request never interrupts the item in flight, it only prevents the
//! next one from starting, and a cancelled run never emits 100.

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod controller;
pub mod error;
pub mod observer;
pub mod ports;
pub mod processor;
pub mod progress;
pub mod settings;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod worker;

// Public API exports
pub use batch::{Batch, OutputLocation};
pub use controller::{BatchController, KNOWN_EXTENSION};
pub use error::{AbgRemovalError, Result};
pub use observer::{CloseDecision, DisplayReporter, ProgressSession, CLOSE_JOIN_TIMEOUT};
pub use ports::{AutoConfirm, ConfirmationPort, NullDisplay, ProgressDisplay, RecordingDisplay};
pub use processor::{ExternalCommandProcessor, ImageProcessor, MockProcessor, OUTPUT_SUFFIX};
pub use progress::{
    interim_progress, BatchOutcome, BatchProgressReporter, BatchSummary, ChannelProgressReporter,
    ConsoleProgressReporter, FailedItem, NoOpProgressReporter, ProgressEvent,
    RecordingProgressReporter,
};
pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
pub use worker::{BatchWorker, StopHandle, WorkerState};

#[cfg(feature = "cli")]
pub use tracing_config::TracingConfig;
