mod events;
pub(crate) mod input;
pub(crate) mod keymap;
mod options;
mod runtime;
mod session;
mod status;
mod terminal;

pub use events::AppEvent;
pub use input::KeyAction;
pub use keymap::KeymapContext;
pub use options::UiOptions;
pub use runtime::{ErrorPanel, ErrorRow, Mode, OverlayOutcome, SelectionResult, SubmissionState};
pub use session::{RunForm, SessionOutcome};
pub use status::{COPIED_STATUS, READY_STATUS};

#[cfg(test)]
pub(crate) use runtime::App;
