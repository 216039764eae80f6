use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    domain::FormSnapshot,
    services::{FormStore, HashHistory, RepositoryHistory, ServiceError},
};

pub const FORM_FILE: &str = "form.json";
pub const HASH_HISTORY_FILE: &str = "file_hashes.json";
pub const REPOSITORY_HISTORY_FILE: &str = "repositories.json";
const REPOSITORY_HISTORY_LIMIT: usize = 20;

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "cache file unreadable");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "ignoring corrupt cache file");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            ServiceError::io(format!("failed to create {}: {err}", parent.display()))
        })?;
    }
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| ServiceError::io(format!("failed to encode cache: {err}")))?;
    fs::write(path, bytes)
        .map_err(|err| ServiceError::io(format!("failed to write {}: {err}", path.display())))
}

/// Keeps the in-progress form in `<cache>/form.json`.
#[derive(Debug, Clone)]
pub struct JsonFormStore {
    path: PathBuf,
}

impl JsonFormStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(FORM_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FormStore for JsonFormStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), ServiceError> {
        write_json(&self.path, snapshot)
    }

    fn load(&self) -> Option<FormSnapshot> {
        read_json::<FormSnapshot>(&self.path).filter(|snapshot| !snapshot.is_empty())
    }

    fn clear(&self) -> Result<(), ServiceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ServiceError::io(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

/// File identity to last submitted hash, in `<cache>/file_hashes.json`.
#[derive(Debug, Clone)]
pub struct JsonHashHistory {
    path: PathBuf,
}

impl JsonHashHistory {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(HASH_HISTORY_FILE),
        }
    }

    fn entries(&self) -> BTreeMap<String, String> {
        read_json(&self.path).unwrap_or_default()
    }
}

impl HashHistory for JsonHashHistory {
    fn get(&self, file_identity: &str) -> Option<String> {
        self.entries().remove(file_identity)
    }

    fn set(&self, file_identity: &str, hash: &str) -> Result<(), ServiceError> {
        let mut entries = self.entries();
        entries.insert(file_identity.to_string(), hash.to_string());
        write_json(&self.path, &entries)
    }
}

/// Recently used repositories in `<cache>/repositories.json`, newest first.
#[derive(Debug, Clone)]
pub struct JsonRepositoryHistory {
    path: PathBuf,
}

impl JsonRepositoryHistory {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(REPOSITORY_HISTORY_FILE),
        }
    }
}

impl RepositoryHistory for JsonRepositoryHistory {
    fn load(&self) -> Vec<String> {
        read_json(&self.path).unwrap_or_default()
    }

    fn record(&self, repository: &str) -> Result<(), ServiceError> {
        let mut repositories = self.load();
        repositories.retain(|existing| existing != repository);
        repositories.insert(0, repository.to_string());
        repositories.truncate(REPOSITORY_HISTORY_LIMIT);
        write_json(&self.path, &repositories)
    }
}
