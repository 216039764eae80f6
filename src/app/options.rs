use std::{sync::Arc, time::Duration};

use super::keymap::{self, KeymapStore};

#[derive(Debug, Clone)]
pub struct UiOptions {
    pub tick_rate: Duration,
    pub confirm_exit: bool,
    pub show_help: bool,
    /// Return from the session as soon as a run is created.
    pub exit_on_success: bool,
    pub double_tap_window: Duration,
    pub clipboard_flash: Duration,
    pub repository_history: Vec<String>,
    /// Repository of the working copy, offered first by the fuzzy finder.
    pub detected_repository: Option<String>,
    pub(crate) keymap_store: Arc<KeymapStore>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            confirm_exit: true,
            show_help: true,
            exit_on_success: false,
            double_tap_window: Duration::from_millis(1000),
            clipboard_flash: Duration::from_secs(2),
            repository_history: Vec::new(),
            detected_repository: None,
            keymap_store: keymap::default_store(),
        }
    }
}

impl UiOptions {
    pub(crate) fn with_keymap_store(mut self, keymap_store: Arc<KeymapStore>) -> Self {
        self.keymap_store = keymap_store;
        self
    }

    /// Replace the compiled-in keybindings with a JSON keymap document.
    pub fn with_keymap_json(self, source: &str) -> anyhow::Result<Self> {
        let store = KeymapStore::from_json(source)?;
        Ok(self.with_keymap_store(Arc::new(store)))
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub fn with_confirm_exit(mut self, confirm: bool) -> Self {
        self.confirm_exit = confirm;
        self
    }

    pub fn with_exit_on_success(mut self, exit: bool) -> Self {
        self.exit_on_success = exit;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: Duration) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_double_tap_window(mut self, window: Duration) -> Self {
        self.double_tap_window = window;
        self
    }

    pub fn with_clipboard_flash(mut self, flash: Duration) -> Self {
        self.clipboard_flash = flash;
        self
    }

    pub fn with_repository_history<I, S>(mut self, history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.repository_history = history.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_detected_repository(mut self, repository: impl Into<String>) -> Self {
        self.detected_repository = Some(repository.into());
        self
    }
}
