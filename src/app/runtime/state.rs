use crate::domain::{Run, Task};

use super::error_panel::ErrorPanel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
}

/// Where the form is in its submit cycle. Exactly one variant holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    /// A request is in flight; only a result carrying `token` is accepted.
    Submitting { token: u64 },
    /// The remote reported a duplicate; `task` is resent verbatim on confirm.
    DuplicateConfirm { run_id: String, task: Task },
    Error(ErrorPanel),
    Success { run: Run },
}

impl SubmissionState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SubmissionState::Submitting { .. }
                | SubmissionState::DuplicateConfirm { .. }
                | SubmissionState::Error(_)
        )
    }

    pub fn accepts(&self, token: u64) -> bool {
        matches!(self, SubmissionState::Submitting { token: current } if *current == token)
    }
}
