//! Batch data types
//!
//! A [`Batch`] is the unit of work handed to a [`crate::worker::BatchWorker`]:
//! an ordered list of input files plus the output location they share. Once
//! constructed it is read-only; the worker never mutates it.

use crate::error::{AbgRemovalError, Result};
use std::path::{Path, PathBuf};

/// Where processed images are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLocation {
    /// Write each output next to its input file
    BesideInput,
    /// Write all outputs into a single directory
    Directory(PathBuf),
}

impl OutputLocation {
    /// Build an output location from the persisted `save_location` setting
    ///
    /// An empty string is the sentinel for "location of the original image".
    #[must_use]
    pub fn from_setting(save_location: &str) -> Self {
        if save_location.is_empty() {
            Self::BesideInput
        } else {
            Self::Directory(PathBuf::from(save_location))
        }
    }

    /// The explicit output directory, if one is configured
    #[must_use]
    pub fn as_dir(&self) -> Option<&Path> {
        match self {
            Self::BesideInput => None,
            Self::Directory(dir) => Some(dir),
        }
    }
}

/// An ordered, immutable-once-started sequence of input files with a shared
/// output location
#[derive(Debug, Clone)]
pub struct Batch {
    items: Vec<PathBuf>,
    output: OutputLocation,
}

impl Batch {
    /// Create a batch, validating its construction invariants
    ///
    /// The item list must be non-empty and every path must be absolute and
    /// exist at construction time. Existence is not re-checked per item
    /// afterwards; the image processor performs its own verification.
    pub fn new(items: Vec<PathBuf>, output: OutputLocation) -> Result<Self> {
        if items.is_empty() {
            return Err(AbgRemovalError::invalid_batch(
                "a batch must contain at least one file",
            ));
        }
        for item in &items {
            if !item.is_absolute() {
                return Err(AbgRemovalError::invalid_batch(format!(
                    "path is not absolute: '{}'",
                    item.display()
                )));
            }
            if !item.is_file() {
                return Err(AbgRemovalError::invalid_batch(format!(
                    "file does not exist: '{}'",
                    item.display()
                )));
            }
        }
        Ok(Self { items, output })
    }

    /// The ordered input files
    #[must_use]
    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    /// Number of items in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// A batch is never empty; provided for API completeness
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The shared output location
    #[must_use]
    pub fn output(&self) -> &OutputLocation {
        &self.output
    }
}
