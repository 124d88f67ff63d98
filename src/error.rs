//! Error types for batch background removal operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for batch background removal operations
pub type Result<T> = std::result::Result<T, AbgRemovalError>;

/// Error types for the batch-processing core
#[derive(Error, Debug)]
pub enum AbgRemovalError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required model artifact is missing at startup
    ///
    /// This is fatal to the whole processing capability: no batch may run
    /// until the model file is present at the configured path.
    #[error("Model file not found at '{0}'. Place the model artifact there before starting a batch")]
    ModelMissing(PathBuf),

    /// A batch violated a construction invariant (empty, relative or
    /// non-existent paths)
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// A single item failed to process
    ///
    /// Recoverable at the worker boundary: the batch continues and the
    /// failure is recorded in the batch summary.
    #[error("Processing error: {0}")]
    Processing(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Settings store (de)serialization errors
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl AbgRemovalError {
    /// Create a new invalid batch error
    pub fn invalid_batch<S: Into<String>>(msg: S) -> Self {
        Self::InvalidBatch(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a processing error carrying the failing item's path
    pub fn item_failed<P: AsRef<Path>>(path: P, details: &str) -> Self {
        Self::Processing(format!(
            "Failed to process '{}': {}",
            path.as_ref().display(),
            details
        ))
    }
}
