use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    domain::{Run, Task, content_hash},
    form::FieldRegistry,
    services::{RunService, ServiceError, Services, VcsContext},
};

pub const DEFAULT_SOURCE_BRANCH: &str = "main";
pub const TARGET_BRANCH_PREFIX: &str = "repobird/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt is required")]
    MissingPrompt,
    #[error("Repository is required")]
    MissingRepository,
}

/// Build the task to submit.
///
/// A loaded config file wins and skips validation (it was checked when it
/// was parsed). Otherwise the form is validated and, if no hash is cached
/// yet, one is computed and cached on the registry.
pub fn prepare_task(registry: &mut FieldRegistry) -> Result<Task, ValidationError> {
    if let Some(loaded) = registry.loaded_config() {
        let mut task = loaded.task.clone();
        task.content_hash = (!loaded.file_hash.is_empty()).then(|| loaded.file_hash.clone());
        return Ok(task);
    }

    let mut task = registry.form_task();
    validate(&task)?;
    let hash = match registry.content_hash() {
        Some(existing) => existing.to_string(),
        None => {
            let computed = content_hash(&task);
            registry.set_content_hash(computed.clone());
            computed
        }
    };
    task.content_hash = Some(hash);
    Ok(task)
}

pub fn validate(task: &Task) -> Result<(), ValidationError> {
    if task.prompt.trim().is_empty() {
        return Err(ValidationError::MissingPrompt);
    }
    if task.repository.trim().is_empty() {
        return Err(ValidationError::MissingRepository);
    }
    Ok(())
}

/// Checks a task read from a file. The repository may stay blank; [`autofill`]
/// takes it from the working copy at submit time.
pub fn validate_loaded(task: &Task) -> Result<(), ValidationError> {
    if task.prompt.trim().is_empty() {
        return Err(ValidationError::MissingPrompt);
    }
    Ok(())
}

/// Whether [`autofill`] would consult the VCS context.
pub fn needs_vcs_context(task: &Task) -> bool {
    task.repository.trim().is_empty() || task.source.trim().is_empty()
}

/// Fill blank repository and branches. `vcs` is the working-copy
/// `(repository, branch)` when it could be determined.
pub fn autofill(task: &mut Task, vcs: Option<&(String, String)>, now: DateTime<Utc>) {
    if task.repository.trim().is_empty()
        && let Some((repo, _)) = vcs
    {
        task.repository = repo.clone();
    }
    if task.source.trim().is_empty() {
        task.source = vcs
            .map(|(_, branch)| branch.as_str())
            .filter(|branch| !branch.is_empty())
            .unwrap_or(DEFAULT_SOURCE_BRANCH)
            .to_string();
    }
    if task.target.trim().is_empty() {
        task.target = format!("{TARGET_BRANCH_PREFIX}{}", now.timestamp());
    }
}

/// Runs one submission attempt off the event loop.
#[derive(Clone)]
pub struct SubmissionPipeline {
    runs: Arc<dyn RunService>,
    vcs: Arc<dyn VcsContext>,
}

impl SubmissionPipeline {
    pub fn new(services: &Services) -> Self {
        Self {
            runs: Arc::clone(&services.runs),
            vcs: Arc::clone(&services.vcs),
        }
    }

    /// Auto-fill, then call the remote. The prepared task is returned next to
    /// the result so a duplicate confirmation can resend it unchanged.
    pub async fn execute(&self, mut task: Task, force: bool) -> (Task, Result<Run, ServiceError>) {
        let context = if needs_vcs_context(&task) {
            let vcs = Arc::clone(&self.vcs);
            match tokio::task::spawn_blocking(move || vcs.current_repo_and_branch()).await {
                Ok(Ok(context)) => Some(context),
                Ok(Err(err)) => {
                    debug!(error = %err, "vcs context unavailable; using defaults");
                    None
                }
                Err(err) => {
                    debug!(error = %err, "vcs lookup task failed");
                    None
                }
            }
        } else {
            None
        };
        autofill(&mut task, context.as_ref(), Utc::now());
        task.force = force;
        info!(
            repository = %task.repository,
            source = %task.source,
            target = %task.target,
            force,
            "submitting run"
        );
        let result = self.runs.create_run(&task, force).await;
        (task, result)
    }
}
