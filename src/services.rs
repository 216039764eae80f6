//! Contracts for everything the form talks to but does not own.
//!
//! The runtime only ever reaches these through [`Services`]; concrete adapters
//! live in [`crate::io`] and in the CLI, fixtures in `testing`.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{FormSnapshot, Run, Task};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The remote rejected or failed the request; the text is passed through
    /// verbatim because duplicate detection is parsed out of it.
    #[error("{0}")]
    Remote(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Io(String),
    #[error("{0} is not available")]
    Unavailable(&'static str),
}

impl ServiceError {
    pub fn remote(message: impl Into<String>) -> Self {
        ServiceError::Remote(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        ServiceError::Io(message.into())
    }
}

#[async_trait]
pub trait RunService: Send + Sync {
    async fn create_run(&self, task: &Task, force: bool) -> Result<Run, ServiceError>;
}

pub trait VcsContext: Send + Sync {
    /// Repository (`owner/name`) and branch of the working directory.
    fn current_repo_and_branch(&self) -> Result<(String, String), ServiceError>;
}

pub trait FormStore: Send + Sync {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), ServiceError>;
    fn load(&self) -> Option<FormSnapshot>;
    fn clear(&self) -> Result<(), ServiceError>;
}

pub trait HashHistory: Send + Sync {
    fn get(&self, file_identity: &str) -> Option<String>;
    fn set(&self, file_identity: &str, hash: &str) -> Result<(), ServiceError>;
}

/// Repositories that received a run, most recent first.
pub trait RepositoryHistory: Send + Sync {
    fn load(&self) -> Vec<String>;
    fn record(&self, repository: &str) -> Result<(), ServiceError>;
}

pub trait ConfigLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Task, ServiceError>;
    fn hash(&self, path: &Path) -> Result<String, ServiceError>;
}

pub trait ClipboardSink: Send + Sync {
    fn write(&self, text: &str) -> Result<(), ServiceError>;
}

/// The collaborator bundle handed to the runtime.
#[derive(Clone)]
pub struct Services {
    pub runs: Arc<dyn RunService>,
    pub vcs: Arc<dyn VcsContext>,
    pub form_store: Arc<dyn FormStore>,
    pub hash_history: Arc<dyn HashHistory>,
    pub repository_history: Arc<dyn RepositoryHistory>,
    pub config_loader: Arc<dyn ConfigLoader>,
    pub clipboard: Arc<dyn ClipboardSink>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
