use std::path::PathBuf;

use crate::{
    domain::{Run, Task},
    services::ServiceError,
};

/// Results posted back to the event loop by background work.
#[derive(Debug)]
pub enum AppEvent {
    SubmissionFinished {
        token: u64,
        /// The task as sent, after auto-fill.
        task: Task,
        result: Result<Run, ServiceError>,
    },
    ConfigLoaded {
        path: PathBuf,
        /// Parsed task and file hash; the hash is empty if hashing failed.
        result: Result<(Task, String), ServiceError>,
    },
    ClipboardWritten {
        result: Result<(), ServiceError>,
    },
}
