use crate::form::FocusCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRow {
    Message,
    BackToForm,
}

/// Failure panel shown over the form. Holds a copy of the cursor taken on
/// entry and hands it back untouched on dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    message: String,
    row: ErrorRow,
    saved_focus: FocusCursor,
}

impl ErrorPanel {
    pub fn new(message: impl Into<String>, focus: FocusCursor) -> Self {
        Self {
            message: message.into(),
            row: ErrorRow::Message,
            saved_focus: focus,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn row(&self) -> ErrorRow {
        self.row
    }

    /// Two rows, no wrap.
    pub fn step(&mut self, delta: i32) {
        self.row = match (self.row, delta.signum()) {
            (ErrorRow::Message, 1) => ErrorRow::BackToForm,
            (ErrorRow::BackToForm, -1) => ErrorRow::Message,
            (row, _) => row,
        };
    }

    /// Text to copy, available only while the message row is selected.
    pub fn copy_text(&self) -> Option<&str> {
        (self.row == ErrorRow::Message).then_some(self.message.as_str())
    }

    pub fn into_saved_focus(self) -> FocusCursor {
        self.saved_focus
    }
}
