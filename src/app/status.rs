#[derive(Debug, Clone)]
pub struct StatusLine {
    message: String,
}

pub const READY_STATUS: &str = "Ready. Press i to edit, Ctrl+S to submit.";
pub const COPIED_STATUS: &str = "Copied to clipboard";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub fn editing(&mut self, label: &str) {
        self.message = format!("Editing {label}");
    }

    pub fn submitting(&mut self) {
        self.message = "Submitting run... Esc to cancel".to_string();
    }

    pub fn cancelled(&mut self) {
        self.message = "Submission cancelled".to_string();
    }

    pub fn created(&mut self, run_id: &str) {
        self.message = format!("Run {run_id} created");
    }

    pub fn duplicate(&mut self, run_id: &str) {
        self.message = format!("Duplicate of run {run_id}. Submit anyway? (y/n)");
    }

    pub fn copied(&mut self) {
        self.message = COPIED_STATUS.to_string();
    }

    pub fn pending_exit(&mut self) {
        self.message = "Unsaved changes. Press q again to leave the form.".to_string();
    }

    /// Drop the clipboard flash if it is still showing.
    pub fn expire_flash(&mut self) {
        if self.message == COPIED_STATUS {
            self.ready();
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
