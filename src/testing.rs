//! In-memory collaborators for headless tests.

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    domain::{FormSnapshot, Run, Task},
    services::{
        ClipboardSink, ConfigLoader, FormStore, HashHistory, RepositoryHistory, RunService,
        ServiceError, Services, VcsContext,
    },
};

/// Replays queued results in order; answers `Run { id: "1" }` once drained.
#[derive(Default)]
pub struct ScriptedRunService {
    responses: Mutex<VecDeque<Result<Run, ServiceError>>>,
    calls: Mutex<Vec<(Task, bool)>>,
}

impl ScriptedRunService {
    pub fn new(responses: impl IntoIterator<Item = Result<Run, ServiceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    pub fn push(&self, response: Result<Run, ServiceError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<(Task, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RunService for ScriptedRunService {
    async fn create_run(&self, task: &Task, force: bool) -> Result<Run, ServiceError> {
        self.calls.lock().unwrap().push((task.clone(), force));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Run::new("1")))
    }
}

pub struct StaticVcs(pub Option<(String, String)>);

impl StaticVcs {
    pub fn new(repo: &str, branch: &str) -> Self {
        Self(Some((repo.to_string(), branch.to_string())))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl VcsContext for StaticVcs {
    fn current_repo_and_branch(&self) -> Result<(String, String), ServiceError> {
        self.0
            .clone()
            .ok_or(ServiceError::Unavailable("git repository"))
    }
}

#[derive(Default)]
pub struct MemoryFormStore {
    snapshot: Mutex<Option<FormSnapshot>>,
    saves: Mutex<usize>,
    fail: bool,
}

impl MemoryFormStore {
    pub fn with_snapshot(snapshot: FormSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<FormSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl FormStore for MemoryFormStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::io("disk full"));
        }
        *self.saves.lock().unwrap() += 1;
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Option<FormSnapshot> {
        self.current()
    }

    fn clear(&self) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::io("disk full"));
        }
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHashHistory {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryHashHistory {
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }
}

impl HashHistory for MemoryHashHistory {
    fn get(&self, file_identity: &str) -> Option<String> {
        self.entries.lock().unwrap().get(file_identity).cloned()
    }

    fn set(&self, file_identity: &str, hash: &str) -> Result<(), ServiceError> {
        self.entries
            .lock()
            .unwrap()
            .insert(file_identity.to_string(), hash.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRepositoryHistory {
    repositories: Mutex<Vec<String>>,
}

impl MemoryRepositoryHistory {
    pub fn repositories(&self) -> Vec<String> {
        self.repositories.lock().unwrap().clone()
    }
}

impl RepositoryHistory for MemoryRepositoryHistory {
    fn load(&self) -> Vec<String> {
        self.repositories()
    }

    fn record(&self, repository: &str) -> Result<(), ServiceError> {
        let mut repositories = self.repositories.lock().unwrap();
        repositories.retain(|existing| existing != repository);
        repositories.insert(0, repository.to_string());
        Ok(())
    }
}

/// Serves tasks registered per path.
#[derive(Default)]
pub struct StubConfigLoader {
    files: Mutex<HashMap<PathBuf, (Task, Option<String>)>>,
}

impl StubConfigLoader {
    pub fn insert(&self, path: impl Into<PathBuf>, task: Task, hash: Option<&str>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), (task, hash.map(str::to_string)));
    }
}

impl ConfigLoader for StubConfigLoader {
    fn load(&self, path: &Path) -> Result<Task, ServiceError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|(task, _)| task.clone())
            .ok_or_else(|| ServiceError::io(format!("{}: no such file", path.display())))
    }

    fn hash(&self, path: &Path) -> Result<String, ServiceError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .and_then(|(_, hash)| hash.clone())
            .ok_or_else(|| ServiceError::io("hash unavailable"))
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    writes: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn write(&self, text: &str) -> Result<(), ServiceError> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Handles to every fixture so tests can script and inspect them.
#[derive(Clone)]
pub struct Fixtures {
    pub runs: Arc<ScriptedRunService>,
    pub vcs: Arc<StaticVcs>,
    pub form_store: Arc<MemoryFormStore>,
    pub hash_history: Arc<MemoryHashHistory>,
    pub repository_history: Arc<MemoryRepositoryHistory>,
    pub config_loader: Arc<StubConfigLoader>,
    pub clipboard: Arc<RecordingClipboard>,
}

impl Default for Fixtures {
    fn default() -> Self {
        Self {
            runs: Arc::new(ScriptedRunService::default()),
            vcs: Arc::new(StaticVcs::none()),
            form_store: Arc::new(MemoryFormStore::default()),
            hash_history: Arc::new(MemoryHashHistory::default()),
            repository_history: Arc::new(MemoryRepositoryHistory::default()),
            config_loader: Arc::new(StubConfigLoader::default()),
            clipboard: Arc::new(RecordingClipboard::default()),
        }
    }
}

impl Fixtures {
    pub fn with_vcs(mut self, vcs: StaticVcs) -> Self {
        self.vcs = Arc::new(vcs);
        self
    }

    pub fn with_form_store(mut self, store: MemoryFormStore) -> Self {
        self.form_store = Arc::new(store);
        self
    }

    pub fn services(&self) -> Services {
        Services {
            runs: self.runs.clone(),
            vcs: self.vcs.clone(),
            form_store: self.form_store.clone(),
            hash_history: self.hash_history.clone(),
            repository_history: self.repository_history.clone(),
            config_loader: self.config_loader.clone(),
            clipboard: self.clipboard.clone(),
        }
    }
}
