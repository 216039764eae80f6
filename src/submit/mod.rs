mod classify;
mod pipeline;

pub use classify::{INVALID_RUN_ID, SubmissionOutcome, classify, parse_duplicate};
pub use pipeline::{
    DEFAULT_SOURCE_BRANCH, SubmissionPipeline, TARGET_BRANCH_PREFIX, ValidationError, autofill,
    needs_vcs_context, prepare_task, validate, validate_loaded,
};
