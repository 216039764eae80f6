//! Filesystem and process adapters for the collaborator traits in
//! [`crate::services`].

mod clipboard;
mod config;
mod format;
mod store;
mod vcs;

pub use clipboard::CommandClipboard;
pub use config::FileConfigLoader;
pub use format::{DocumentFormat, parse_task_str};
pub use store::{
    FORM_FILE, HASH_HISTORY_FILE, JsonFormStore, JsonHashHistory, JsonRepositoryHistory,
    REPOSITORY_HISTORY_FILE,
};
pub use vcs::{GitContext, normalize_remote};
