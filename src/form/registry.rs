use std::{path::PathBuf, sync::Arc};

use tracing::warn;

use crate::{
    domain::{FormSnapshot, RunType, Task},
    services::FormStore,
};

use super::{
    slot::{SlotId, TextKind},
    text::TextBuffer,
};

/// A task loaded from a config file, submitted as-is unless the user edits
/// the form afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub task: Task,
    /// Empty when hashing the file failed.
    pub file_hash: String,
}

impl LoadedConfig {
    pub fn file_identity(&self) -> String {
        self.path.display().to_string()
    }
}

/// Ordered catalog of the form's slots and their values.
pub struct FieldRegistry {
    repository: TextBuffer,
    source: TextBuffer,
    target: TextBuffer,
    title: TextBuffer,
    issue: TextBuffer,
    prompt: TextBuffer,
    context: TextBuffer,
    run_type: RunType,
    context_visible: bool,
    config_label: String,
    loaded: Option<LoadedConfig>,
    content_hash: Option<String>,
    dirty: bool,
    store: Option<Arc<dyn FormStore>>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self {
            repository: TextBuffer::single_line(),
            source: TextBuffer::single_line(),
            target: TextBuffer::single_line(),
            title: TextBuffer::single_line(),
            issue: TextBuffer::single_line(),
            prompt: TextBuffer::multi_line(),
            context: TextBuffer::multi_line(),
            run_type: RunType::default(),
            context_visible: false,
            config_label: String::new(),
            loaded: None,
            content_hash: None,
            dirty: false,
            store: None,
        }
    }
}

impl std::fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("snapshot", &self.snapshot())
            .field("context_visible", &self.context_visible)
            .field("loaded", &self.loaded)
            .field("content_hash", &self.content_hash)
            .finish()
    }
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn FormStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Current slot ordering. Recomputed on every call.
    pub fn visible_slots(&self) -> Vec<SlotId> {
        let mut slots = vec![SlotId::ConfigLoader, SlotId::RunTypeToggle];
        slots.extend(TextKind::ALL.iter().copied().map(SlotId::Text));
        slots.push(SlotId::Prompt);
        if self.context_visible {
            slots.push(SlotId::Context);
        }
        slots
    }

    pub fn get(&self, slot: SlotId) -> &str {
        match slot {
            SlotId::ConfigLoader => &self.config_label,
            SlotId::RunTypeToggle => self.run_type.as_str(),
            other => self
                .buffer(other)
                .map(TextBuffer::as_str)
                .unwrap_or_default(),
        }
    }

    pub fn set(&mut self, slot: SlotId, value: &str) {
        match slot {
            SlotId::ConfigLoader => {
                self.config_label = value.to_string();
                return;
            }
            SlotId::RunTypeToggle => {
                self.run_type = match value.trim() {
                    "plan" => RunType::Plan,
                    _ => RunType::Run,
                };
            }
            other => {
                if let Some(buffer) = self.buffer_mut(other) {
                    buffer.set(value);
                }
            }
        }
        self.after_edit();
    }

    pub fn buffer(&self, slot: SlotId) -> Option<&TextBuffer> {
        match slot {
            SlotId::Text(TextKind::Repository) => Some(&self.repository),
            SlotId::Text(TextKind::Source) => Some(&self.source),
            SlotId::Text(TextKind::Target) => Some(&self.target),
            SlotId::Text(TextKind::Title) => Some(&self.title),
            SlotId::Text(TextKind::Issue) => Some(&self.issue),
            SlotId::Prompt => Some(&self.prompt),
            SlotId::Context => Some(&self.context),
            SlotId::ConfigLoader | SlotId::RunTypeToggle => None,
        }
    }

    fn buffer_mut(&mut self, slot: SlotId) -> Option<&mut TextBuffer> {
        match slot {
            SlotId::Text(TextKind::Repository) => Some(&mut self.repository),
            SlotId::Text(TextKind::Source) => Some(&mut self.source),
            SlotId::Text(TextKind::Target) => Some(&mut self.target),
            SlotId::Text(TextKind::Title) => Some(&mut self.title),
            SlotId::Text(TextKind::Issue) => Some(&mut self.issue),
            SlotId::Prompt => Some(&mut self.prompt),
            SlotId::Context => Some(&mut self.context),
            SlotId::ConfigLoader | SlotId::RunTypeToggle => None,
        }
    }

    /// Run an in-place edit on a text slot; mirrors the result when the
    /// contents actually changed.
    pub fn edit(&mut self, slot: SlotId, edit: impl FnOnce(&mut TextBuffer) -> bool) -> bool {
        let changed = self.buffer_mut(slot).map(edit).unwrap_or(false);
        if changed {
            self.after_edit();
        }
        changed
    }

    pub fn run_type(&self) -> RunType {
        self.run_type
    }

    pub fn toggle_run_type(&mut self) -> RunType {
        self.run_type = self.run_type.toggled();
        self.after_edit();
        self.run_type
    }

    pub fn context_visible(&self) -> bool {
        self.context_visible
    }

    pub fn set_context_visible(&mut self, visible: bool) {
        self.context_visible = visible;
    }

    pub fn loaded_config(&self) -> Option<&LoadedConfig> {
        self.loaded.as_ref()
    }

    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    pub fn set_content_hash(&mut self, hash: String) {
        self.content_hash = Some(hash);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            repository: self.repository.as_str().to_string(),
            source: self.source.as_str().to_string(),
            target: self.target.as_str().to_string(),
            title: self.title.as_str().to_string(),
            issue: self.issue.as_str().to_string(),
            prompt: self.prompt.as_str().to_string(),
            context: self.context.as_str().to_string(),
            run_type: self.run_type,
        }
    }

    /// Task assembled from the current field values, without hash or force.
    /// A hidden context area contributes nothing.
    pub fn form_task(&self) -> Task {
        let mut task = Task::from(&self.snapshot());
        if !self.context_visible {
            task.context.clear();
        }
        task
    }

    /// Seed from a persisted snapshot without writing it back.
    pub fn restore(&mut self, snapshot: &FormSnapshot) {
        self.seed(&Task::from(snapshot));
        self.context_visible = !snapshot.context.is_empty();
    }

    /// Populate the form from a loaded config file and remember the file as
    /// the task source.
    pub fn apply_config(&mut self, loaded: LoadedConfig) {
        self.seed(&loaded.task);
        if !loaded.task.context.is_empty() {
            self.context_visible = true;
        }
        self.config_label = loaded.path.display().to_string();
        self.content_hash = (!loaded.file_hash.is_empty()).then(|| loaded.file_hash.clone());
        self.loaded = Some(loaded);
        self.dirty = true;
        self.mirror();
    }

    pub fn clear_all(&mut self) {
        for buffer in [
            &mut self.repository,
            &mut self.source,
            &mut self.target,
            &mut self.title,
            &mut self.issue,
            &mut self.prompt,
            &mut self.context,
        ] {
            buffer.clear();
        }
        self.run_type = RunType::default();
        self.config_label.clear();
        self.loaded = None;
        self.content_hash = None;
        self.dirty = false;
        if let Some(store) = &self.store
            && let Err(err) = store.clear()
        {
            warn!(error = %err, "failed to clear persisted form");
        }
    }

    fn seed(&mut self, task: &Task) {
        self.repository.set(&task.repository);
        self.source.set(&task.source);
        self.target.set(&task.target);
        self.title.set(&task.title);
        self.issue.set(&task.issue);
        self.prompt.set(&task.prompt);
        self.context.set(&task.context);
        self.run_type = task.run_type;
    }

    fn after_edit(&mut self) {
        self.dirty = true;
        // Editing detaches a loaded file: the form is now the source of truth.
        if self.loaded.take().is_some() {
            self.config_label.clear();
        }
        self.content_hash = None;
        self.mirror();
    }

    fn mirror(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save(&self.snapshot()) {
            warn!(error = %err, "failed to persist form snapshot");
        }
    }
}
