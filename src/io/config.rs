use std::{fs, path::Path};

use tracing::debug;

use crate::{
    domain::{Task, bytes_hash},
    services::{ConfigLoader, ServiceError},
    submit::validate_loaded,
};

use super::format::{DocumentFormat, parse_task_str};

/// Reads task files from disk. Only the prompt is checked here; a blank
/// repository is filled from the working copy when the task is submitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileConfigLoader;

impl FileConfigLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self, path: &Path) -> Result<Task, ServiceError> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            ServiceError::io(format!("{}: unsupported task file format", path.display()))
        })?;
        let contents = fs::read_to_string(path)
            .map_err(|err| ServiceError::io(format!("failed to read {}: {err}", path.display())))?;
        let task = parse_task_str(&contents, format)
            .map_err(|err| ServiceError::io(format!("{}: {err:#}", path.display())))?;
        validate_loaded(&task)
            .map_err(|err| ServiceError::io(format!("{}: {err}", path.display())))?;
        debug!(path = %path.display(), %format, "task file parsed");
        Ok(task)
    }

    fn hash(&self, path: &Path) -> Result<String, ServiceError> {
        let bytes = fs::read(path)
            .map_err(|err| ServiceError::io(format!("failed to read {}: {err}", path.display())))?;
        Ok(bytes_hash(&bytes))
    }
}
