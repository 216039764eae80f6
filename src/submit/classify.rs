use std::sync::LazyLock;

use regex::Regex;

use crate::{domain::Run, services::ServiceError};

// The remote reports duplicates only in free text, e.g.
// "Duplicate run detected for this task (ID: 955). Use force to override."
static DUPLICATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)duplicate run detected.*?\(\s*ID:\s*(\d+)\s*\).*?force to override")
        .expect("duplicate pattern compiles")
});

pub const INVALID_RUN_ID: &str = "invalid ID from server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created(Run),
    Duplicate { run_id: String },
    Failed(String),
}

/// Pull the existing run id out of a duplicate-run error message.
pub fn parse_duplicate(message: &str) -> Option<String> {
    DUPLICATE_PATTERN
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

pub fn classify(result: Result<Run, ServiceError>) -> SubmissionOutcome {
    match result {
        Ok(run) if run.id.trim().is_empty() => SubmissionOutcome::Failed(INVALID_RUN_ID.into()),
        Ok(run) => SubmissionOutcome::Created(run),
        Err(err) => {
            let message = err.to_string();
            match parse_duplicate(&message) {
                Some(run_id) => SubmissionOutcome::Duplicate { run_id },
                None => SubmissionOutcome::Failed(message),
            }
        }
    }
}
