//! Persistent user settings
//!
//! The desktop application remembers the save location and the window
//! position between runs. Rather than an ambient global, the store is an
//! injected port with explicit `get`/`set` operations, initialized once at
//! application startup. The JSON-backed implementation persists a flat
//! string map under the platform configuration directory.

use crate::error::{AbgRemovalError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Well-known setting keys
pub mod keys {
    /// Output directory for processed images; empty means "location of the
    /// original image"
    pub const SAVE_LOCATION: &str = "save_location";
    /// Last main-window position, written by the presentation layer
    pub const WINDOW_POSITION: &str = "window_position";
}

/// Injected persistent key-value store
pub trait SettingsStore: Send + Sync {
    /// Read a value, falling back to `default` when the key is unset
    fn get(&self, key: &str, default: &str) -> String;

    /// Write a value and persist it
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON-file-backed settings store
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonSettingsStore {
    /// Open the store at `path`, loading existing values
    ///
    /// A missing file is not an error; it yields an empty store that is
    /// created on the first `set`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let values = if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HashMap::new()
        };
        debug!("loaded settings from {}", path.display());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store at the platform default location
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Platform default settings path
    /// (`<config_dir>/abgremover/settings.json`)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            AbgRemovalError::invalid_config("no configuration directory on this platform")
        })?;
        Ok(config_dir.join("abgremover").join("settings.json"))
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .expect("settings poisoned")
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().expect("settings poisoned");
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }
}

/// In-memory settings store for tests and ephemeral runs
#[derive(Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with `save_location` preset
    #[must_use]
    pub fn with_save_location<P: AsRef<Path>>(dir: P) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .expect("settings poisoned")
            .insert(
                keys::SAVE_LOCATION.to_string(),
                dir.as_ref().to_string_lossy().into_owned(),
            );
        store
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .expect("settings poisoned")
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .expect("settings poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonSettingsStore::open(dir.path().join("settings.json")).expect("open");
        assert_eq!(store.get(keys::SAVE_LOCATION, ""), "");
        assert_eq!(store.get(keys::SAVE_LOCATION, "/fallback"), "/fallback");
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonSettingsStore::open(&path).expect("open");
        store.set(keys::SAVE_LOCATION, "/images/out").expect("set");
        store.set(keys::WINDOW_POSITION, "300,300").expect("set");

        let reopened = JsonSettingsStore::open(&path).expect("reopen");
        assert_eq!(reopened.get(keys::SAVE_LOCATION, ""), "/images/out");
        assert_eq!(reopened.get(keys::WINDOW_POSITION, ""), "300,300");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"not json").expect("fixture");

        let result = JsonSettingsStore::open(&path);
        assert!(matches!(result, Err(AbgRemovalError::Settings(_))));
    }

    #[test]
    fn test_memory_store_with_save_location() {
        let store = MemorySettingsStore::with_save_location("/out");
        assert_eq!(store.get(keys::SAVE_LOCATION, ""), "/out");
        store.set(keys::SAVE_LOCATION, "").expect("set");
        assert_eq!(store.get(keys::SAVE_LOCATION, "x"), "");
    }
}
