//! Presentation-layer ports
//!
//! The windowing toolkit is an external collaborator, so everything the core
//! needs from it is expressed as small injected traits: a yes/no confirmation
//! prompt and a progress display. Frontends implement these; the core never
//! talks to a UI directly.

use std::sync::Mutex;

/// Yes/no confirmation prompt
pub trait ConfirmationPort: Send + Sync {
    /// Ask the user to confirm; `true` means "proceed"
    fn confirm(&self, prompt: &str) -> bool;
}

/// Observable progress surface
///
/// Methods are called from the worker's execution context, so
/// implementations must be thread-safe and cheap.
pub trait ProgressDisplay: Send + Sync {
    /// Update the rendered percentage (0-100)
    fn set_value(&self, percent: u8);

    /// Update the textual label ("Loading...", "42%", ...)
    fn set_label(&self, text: &str);

    /// Enable or disable the confirm/close action
    fn set_close_enabled(&self, enabled: bool);
}

/// Confirmation port with a fixed answer, for headless runs and tests
pub struct AutoConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl AutoConfirm {
    /// Always answer `answer`
    #[must_use]
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

impl ConfirmationPort for AutoConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        self.answer
    }
}

/// Display that discards all updates
pub struct NullDisplay;

impl ProgressDisplay for NullDisplay {
    fn set_value(&self, _percent: u8) {}
    fn set_label(&self, _text: &str) {}
    fn set_close_enabled(&self, _enabled: bool) {}
}

/// Display that records every update for inspection in tests
#[derive(Default)]
pub struct RecordingDisplay {
    values: Mutex<Vec<u8>>,
    labels: Mutex<Vec<String>>,
    close_enabled: Mutex<Vec<bool>>,
}

impl RecordingDisplay {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentages rendered so far, in order
    pub fn values(&self) -> Vec<u8> {
        self.values.lock().expect("display log poisoned").clone()
    }

    /// Labels rendered so far, in order
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().expect("display log poisoned").clone()
    }

    /// History of the close action's enabled flag
    pub fn close_enabled_history(&self) -> Vec<bool> {
        self.close_enabled
            .lock()
            .expect("display log poisoned")
            .clone()
    }

    /// Whether the close action ended up enabled
    pub fn close_enabled(&self) -> bool {
        self.close_enabled_history().last().copied().unwrap_or(false)
    }
}

impl ProgressDisplay for RecordingDisplay {
    fn set_value(&self, percent: u8) {
        self.values
            .lock()
            .expect("display log poisoned")
            .push(percent);
    }

    fn set_label(&self, text: &str) {
        self.labels
            .lock()
            .expect("display log poisoned")
            .push(text.to_string());
    }

    fn set_close_enabled(&self, enabled: bool) {
        self.close_enabled
            .lock()
            .expect("display log poisoned")
            .push(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_confirm_records_prompts() {
        let port = AutoConfirm::new(true);
        assert!(port.confirm("Proceed?"));
        assert!(port.confirm("Really?"));
        assert_eq!(port.prompts(), vec!["Proceed?", "Really?"]);

        let port = AutoConfirm::new(false);
        assert!(!port.confirm("Proceed?"));
    }

    #[test]
    fn test_recording_display_keeps_order() {
        let display = RecordingDisplay::new();
        display.set_label("Loading...");
        display.set_close_enabled(false);
        display.set_value(33);
        display.set_value(100);
        display.set_close_enabled(true);

        assert_eq!(display.values(), vec![33, 100]);
        assert_eq!(display.labels(), vec!["Loading..."]);
        assert_eq!(display.close_enabled_history(), vec![false, true]);
        assert!(display.close_enabled());
    }
}
