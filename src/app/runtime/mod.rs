use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::layout::Rect;
use std::{
    env, mem,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, info, warn};

use crate::{
    domain::{Run, Task},
    form::{DoubleTap, FieldRegistry, Focus, FocusCursor, LoadedConfig, SlotId, TextBuffer, TextKind},
    presentation::{self, SubmissionRender, UiContext},
    services::{ServiceError, Services},
    submit::{SubmissionOutcome, SubmissionPipeline, classify, prepare_task},
};

use super::{
    events::AppEvent,
    input::{InputRouter, KeyAction, KeyDispatch},
    keymap::KeymapContext,
    options::UiOptions,
    session::SessionOutcome,
    status::StatusLine,
    terminal::TerminalGuard,
};

mod error_panel;
mod overlay;
mod state;

pub use error_panel::{ErrorPanel, ErrorRow};
pub use overlay::{OverlayOutcome, SelectionResult};
pub use state::{Mode, SubmissionState};

use overlay::{FileSelector, FuzzyFinder, Overlay};

/// The form controller. Owns the registry and the cursor; everything else
/// reaches it through events drained on the loop thread.
pub(crate) struct App {
    registry: FieldRegistry,
    cursor: FocusCursor,
    mode: Mode,
    double_g: DoubleTap,
    overlay: Option<Overlay>,
    submission: SubmissionState,
    /// A task file that finished loading mid-submission; applied once idle.
    deferred_config: Option<LoadedConfig>,
    last_token: u64,
    validation_hint: Option<String>,
    flash_until: Option<Instant>,
    exit_armed: bool,
    outcome: Option<SessionOutcome>,
    status: StatusLine,
    input_router: InputRouter,
    options: UiOptions,
    services: Services,
    pipeline: SubmissionPipeline,
    runtime: Handle,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(services: Services, options: UiOptions, runtime: Handle) -> Self {
        let mut registry = FieldRegistry::with_store(Arc::clone(&services.form_store));
        if let Some(snapshot) = services.form_store.load() {
            debug!("restoring persisted form");
            registry.restore(&snapshot);
        }
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            cursor: FocusCursor::new(),
            mode: Mode::Normal,
            double_g: DoubleTap::new(options.double_tap_window),
            overlay: None,
            submission: SubmissionState::Idle,
            deferred_config: None,
            last_token: 0,
            validation_hint: None,
            flash_until: None,
            exit_armed: false,
            outcome: None,
            status: StatusLine::new(),
            input_router: InputRouter::new(Arc::clone(&options.keymap_store)),
            pipeline: SubmissionPipeline::new(&services),
            options,
            services,
            runtime,
            events_tx,
            events_rx,
        }
    }

    pub fn run(&mut self) -> Result<SessionOutcome> {
        let mut terminal = TerminalGuard::new()?;
        while self.outcome.is_none() {
            terminal.draw(|frame| self.draw(frame))?;
            if event::poll(self.options.tick_rate)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key_at(key, Instant::now()),
                    Event::Resize(width, height) => {
                        terminal.resize(Rect::new(0, 0, width, height))?;
                    }
                    Event::Mouse(_) => {}
                    Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
                }
            }
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle_event(event, Instant::now());
            }
            self.tick(Instant::now());
        }
        Ok(self.outcome.take().unwrap_or(SessionOutcome::Quit))
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let slots = self.registry.visible_slots();
        let focus = self.cursor.focused(&slots);
        let help = self.current_help_text();
        let submission = match &self.submission {
            SubmissionState::Idle => SubmissionRender::Idle,
            SubmissionState::Submitting { .. } => SubmissionRender::Submitting,
            SubmissionState::DuplicateConfirm { run_id, .. } => {
                SubmissionRender::Duplicate { run_id }
            }
            SubmissionState::Error(panel) => SubmissionRender::Error {
                message: panel.message(),
                row: panel.row(),
            },
            SubmissionState::Success { run } => SubmissionRender::Success { run_id: &run.id },
        };

        presentation::draw(
            frame,
            UiContext {
                registry: &self.registry,
                slots: &slots,
                focus,
                insert_mode: self.mode == Mode::Insert,
                status_message: self.status.message(),
                help: help.as_deref(),
                validation_hint: self.validation_hint.as_deref(),
                dirty: self.registry.is_dirty(),
                flash: self.flash_until.is_some(),
                submission,
                overlay: self.overlay.as_ref().map(Overlay::as_render),
            },
        );
    }

    fn current_help_text(&self) -> Option<String> {
        if !self.options.show_help || self.overlay.is_some() {
            return None;
        }
        self.options.keymap_store.help_text(self.keymap_context())
    }

    fn keymap_context(&self) -> KeymapContext {
        match &self.submission {
            SubmissionState::Submitting { .. } => KeymapContext::Submitting,
            SubmissionState::DuplicateConfirm { .. } => KeymapContext::Duplicate,
            SubmissionState::Error(_) => KeymapContext::Error,
            SubmissionState::Idle | SubmissionState::Success { .. } => match self.mode {
                Mode::Normal => KeymapContext::Normal,
                Mode::Insert => KeymapContext::Insert,
            },
        }
    }

    fn focused(&self) -> Focus {
        self.cursor.focused(&self.registry.visible_slots())
    }

    pub(crate) fn handle_key_at(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(&key);
            return;
        }

        let context = self.keymap_context();
        let dispatch = self.input_router.classify(context, &key);
        debug!(?context, ?dispatch, "key");
        if dispatch != KeyDispatch::Action(KeyAction::JumpFirst) {
            self.double_g.disarm();
        }
        if dispatch != KeyDispatch::Action(KeyAction::Back) {
            self.exit_armed = false;
        }
        match dispatch {
            KeyDispatch::Action(action) => self.handle_action(action, now),
            KeyDispatch::Text(key) => self.handle_text(&key),
            KeyDispatch::Ignored => {}
        }
        self.apply_deferred_config();
    }

    fn handle_action(&mut self, action: KeyAction, now: Instant) {
        if matches!(self.submission, SubmissionState::Success { .. }) {
            self.submission = SubmissionState::Idle;
        }
        match action {
            KeyAction::ForceQuit => self.outcome = Some(SessionOutcome::Quit),
            KeyAction::Cancel => self.cancel_submission(),
            KeyAction::Confirm => self.confirm_duplicate(),
            KeyAction::Decline => self.decline_duplicate(),
            KeyAction::ErrorStep(delta) => {
                if let SubmissionState::Error(panel) = &mut self.submission {
                    panel.step(delta);
                }
            }
            KeyAction::CopyError => self.copy_error(),
            KeyAction::DismissError | KeyAction::RetryError => self.dismiss_error(),
            KeyAction::FocusNext => {
                let len = self.registry.visible_slots().len();
                self.cursor.next(len);
            }
            KeyAction::FocusPrev => {
                let len = self.registry.visible_slots().len();
                self.cursor.prev(len);
            }
            KeyAction::JumpFirst => {
                if self.double_g.press(now) {
                    self.cursor.jump_first();
                }
            }
            KeyAction::JumpLast => self.cursor.jump_last(),
            KeyAction::EnterInsert => self.enter_insert(),
            KeyAction::ExitInsert => {
                self.mode = Mode::Normal;
                self.status.ready();
            }
            KeyAction::InsertEnter => self.insert_enter(),
            KeyAction::Activate => self.activate(),
            KeyAction::FuzzyFind => self.open_fuzzy_finder(),
            KeyAction::ToggleContext => self.toggle_context(),
            KeyAction::Yank => self.yank(),
            KeyAction::ClearForm => self.clear_form(),
            KeyAction::Submit => {
                self.mode = Mode::Normal;
                self.submit();
            }
            KeyAction::Back => self.on_back(),
            KeyAction::ResetStatus => {
                self.validation_hint = None;
                self.status.ready();
            }
        }
    }

    fn handle_text(&mut self, key: &KeyEvent) {
        let Some(slot) = self.focused().slot().filter(|slot| slot.is_editable()) else {
            self.mode = Mode::Normal;
            return;
        };
        if self.registry.edit(slot, |buffer| buffer.handle_key(key)) {
            self.validation_hint = None;
            self.status.editing(slot.label());
        }
    }

    fn enter_insert(&mut self) {
        if let Some(slot) = self.focused().slot()
            && slot.is_editable()
        {
            self.mode = Mode::Insert;
            self.status.editing(slot.label());
        }
    }

    fn insert_enter(&mut self) {
        match self.focused().slot() {
            Some(slot) if slot.is_multiline() => {
                self.registry.edit(slot, TextBuffer::insert_newline);
            }
            _ => {
                self.mode = Mode::Normal;
                self.status.ready();
            }
        }
    }

    fn activate(&mut self) {
        match self.focused() {
            Focus::Slot(SlotId::ConfigLoader) => self.open_file_selector(),
            Focus::Slot(SlotId::RunTypeToggle) => {
                let run_type = self.registry.toggle_run_type();
                self.status.set_raw(format!("Run type: {run_type}"));
            }
            Focus::Slot(_) => self.enter_insert(),
            Focus::Submit => self.submit(),
            Focus::Back => self.on_back(),
        }
    }

    fn toggle_context(&mut self) {
        let visible = !self.registry.context_visible();
        let hiding_focused = !visible && self.focused() == Focus::Slot(SlotId::Context);
        self.registry.set_context_visible(visible);
        let slots = self.registry.visible_slots();
        if hiding_focused {
            self.cursor.focus_slot(&slots, SlotId::Prompt);
        } else {
            self.cursor.clamp(slots.len());
        }
        self.status
            .set_raw(if visible { "Context shown" } else { "Context hidden" });
    }

    fn clear_form(&mut self) {
        self.registry.clear_all();
        self.validation_hint = None;
        self.mode = Mode::Normal;
        self.status.set_raw("Form cleared");
    }

    fn on_back(&mut self) {
        if self.options.confirm_exit && self.registry.is_dirty() && !self.exit_armed {
            self.exit_armed = true;
            self.status.pending_exit();
            return;
        }
        self.outcome = Some(SessionOutcome::Back);
    }

    fn open_fuzzy_finder(&mut self) {
        let target = SlotId::Text(TextKind::Repository);
        let current = self.registry.get(target).to_string();
        let sources = self
            .options
            .detected_repository
            .iter()
            .cloned()
            .chain(Some(current))
            .chain(self.options.repository_history.iter().cloned());
        self.overlay = Some(Overlay::Fuzzy(FuzzyFinder::new(target, sources)));
        self.status
            .set_raw("Type to filter, ↑/↓ to move, Enter to pick, Esc to cancel");
    }

    fn open_file_selector(&mut self) {
        let dir = self
            .registry
            .loaded_config()
            .and_then(|loaded| loaded.path.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        self.overlay = Some(Overlay::Files(FileSelector::new(dir, true)));
        self.status
            .set_raw("Enter to open, Backspace for parent, Esc to cancel");
    }

    fn handle_overlay_key(&mut self, key: &KeyEvent) {
        if self.input_router.classify(KeymapContext::Overlay, key)
            == KeyDispatch::Action(KeyAction::ForceQuit)
        {
            self.outcome = Some(SessionOutcome::Quit);
            return;
        }
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        if let OverlayOutcome::Finished(result) = overlay.handle(key)
            && let Some(overlay) = self.overlay.take()
        {
            self.apply_selection(overlay, result);
        }
    }

    fn apply_selection(&mut self, overlay: Overlay, result: SelectionResult) {
        let Some(value) = result.selected.filter(|_| !result.canceled) else {
            self.status.ready();
            return;
        };
        match overlay {
            Overlay::Fuzzy(finder) => {
                let target = finder.target();
                self.registry.set(target, &value);
                let slots = self.registry.visible_slots();
                self.cursor.focus_slot(&slots, target);
                self.validation_hint = None;
                self.status.set_raw(format!("{}: {value}", target.label()));
            }
            Overlay::Files(selector) if selector.for_config_load() => {
                self.load_config(PathBuf::from(value));
            }
            Overlay::Files(_) => self.status.ready(),
        }
    }

    /// Read and hash a task file off the loop thread.
    pub(crate) fn load_config(&mut self, path: PathBuf) {
        let loader = Arc::clone(&self.services.config_loader);
        let tx = self.events_tx.clone();
        self.status.set_raw(format!("Loading {}", path.display()));
        self.runtime.spawn_blocking(move || {
            let result = loader.load(&path).map(|task| {
                let hash = loader.hash(&path).unwrap_or_else(|err| {
                    warn!(path = %path.display(), error = %err, "hashing task file failed");
                    String::new()
                });
                (task, hash)
            });
            let _ = tx.send(AppEvent::ConfigLoaded { path, result });
        });
    }

    fn yank(&mut self) {
        let Some(slot) = self.focused().slot() else {
            return;
        };
        let value = self.registry.get(slot).to_string();
        if value.is_empty() {
            self.status.set_raw("Nothing to copy");
            return;
        }
        self.write_clipboard(value);
    }

    fn copy_error(&mut self) {
        if let SubmissionState::Error(panel) = &self.submission
            && let Some(text) = panel.copy_text()
        {
            let text = text.to_string();
            self.write_clipboard(text);
        }
    }

    fn write_clipboard(&mut self, text: String) {
        let clipboard = Arc::clone(&self.services.clipboard);
        let tx = self.events_tx.clone();
        self.runtime.spawn_blocking(move || {
            let result = clipboard.write(&text);
            let _ = tx.send(AppEvent::ClipboardWritten { result });
        });
    }

    fn submit(&mut self) {
        if self.submission.is_busy() {
            return;
        }
        self.submission = SubmissionState::Idle;
        match prepare_task(&mut self.registry) {
            Ok(task) => {
                self.validation_hint = None;
                self.start_submission(task, false);
            }
            Err(err) => {
                debug!(error = %err, "submission blocked by validation");
                self.validation_hint = Some(err.to_string());
                self.status.set_raw(err.to_string());
            }
        }
    }

    fn start_submission(&mut self, task: Task, force: bool) {
        self.last_token += 1;
        let token = self.last_token;
        self.submission = SubmissionState::Submitting { token };
        self.mode = Mode::Normal;
        self.status.submitting();
        info!(token, force, "submission started");

        let pipeline = self.pipeline.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let (task, result) = pipeline.execute(task, force).await;
            if tx
                .send(AppEvent::SubmissionFinished {
                    token,
                    task,
                    result,
                })
                .is_err()
            {
                debug!(token, "event loop gone; dropping submission result");
            }
        });
    }

    fn cancel_submission(&mut self) {
        if let SubmissionState::Submitting { token } = self.submission {
            info!(token, "submission cancelled");
            self.submission = SubmissionState::Idle;
            self.status.cancelled();
        }
    }

    fn confirm_duplicate(&mut self) {
        match mem::take(&mut self.submission) {
            SubmissionState::DuplicateConfirm { run_id, task } => {
                info!(%run_id, "resubmitting duplicate with force");
                self.start_submission(task, true);
            }
            other => self.submission = other,
        }
    }

    fn decline_duplicate(&mut self) {
        match mem::take(&mut self.submission) {
            SubmissionState::DuplicateConfirm { run_id, .. } => {
                debug!(%run_id, "duplicate declined");
                self.status.ready();
            }
            other => self.submission = other,
        }
    }

    fn enter_error(&mut self, message: String) {
        self.mode = Mode::Normal;
        self.submission = SubmissionState::Error(ErrorPanel::new(message, self.cursor));
        self.status.set_raw("Something went wrong");
    }

    fn dismiss_error(&mut self) {
        match mem::take(&mut self.submission) {
            SubmissionState::Error(panel) => {
                self.cursor = panel.into_saved_focus();
                self.status.ready();
            }
            other => self.submission = other,
        }
    }

    pub(crate) fn handle_event(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::SubmissionFinished {
                token,
                task,
                result,
            } => self.on_submission_finished(token, task, result),
            AppEvent::ConfigLoaded { path, result } => self.on_config_loaded(path, result),
            AppEvent::ClipboardWritten { result } => match result {
                Ok(()) => {
                    self.flash_until = Some(now + self.options.clipboard_flash);
                    self.status.copied();
                }
                Err(err) => {
                    warn!(error = %err, "clipboard write failed");
                    self.status.set_raw(format!("Copy failed: {err}"));
                }
            },
        }
        self.apply_deferred_config();
    }

    fn on_submission_finished(
        &mut self,
        token: u64,
        task: Task,
        result: Result<Run, ServiceError>,
    ) {
        if !self.submission.accepts(token) {
            debug!(token, "discarding stale submission result");
            return;
        }
        match classify(result) {
            SubmissionOutcome::Created(run) => self.on_run_created(&task, run),
            SubmissionOutcome::Duplicate { run_id } => {
                info!(%run_id, "remote reported a duplicate run");
                self.status.duplicate(&run_id);
                self.submission = SubmissionState::DuplicateConfirm { run_id, task };
            }
            SubmissionOutcome::Failed(message) => {
                warn!(%message, "submission failed");
                self.enter_error(message);
            }
        }
    }

    fn on_run_created(&mut self, task: &Task, run: Run) {
        if let Some(loaded) = self.registry.loaded_config()
            && let Some(hash) = task.content_hash.as_deref().filter(|hash| !hash.is_empty())
            && let Err(err) = self.services.hash_history.set(&loaded.file_identity(), hash)
        {
            warn!(error = %err, "failed to record submitted hash");
        }
        self.remember_repository(&task.repository);
        self.registry.clear_all();
        self.validation_hint = None;
        self.mode = Mode::Normal;
        info!(run_id = %run.id, "run created");
        self.status.created(&run.id);
        if self.options.exit_on_success {
            self.outcome = Some(SessionOutcome::Submitted(run.clone()));
        }
        self.submission = SubmissionState::Success { run };
    }

    fn remember_repository(&mut self, repository: &str) {
        let repository = repository.trim();
        if repository.is_empty() {
            return;
        }
        if let Err(err) = self.services.repository_history.record(repository) {
            warn!(error = %err, "failed to record repository history");
        }
        let history = &mut self.options.repository_history;
        history.retain(|existing| existing != repository);
        history.insert(0, repository.to_string());
    }

    fn on_config_loaded(&mut self, path: PathBuf, result: Result<(Task, String), ServiceError>) {
        match result {
            Ok((task, file_hash)) => {
                let loaded = LoadedConfig {
                    path,
                    task,
                    file_hash,
                };
                if self.submission.is_busy() {
                    info!(file = %loaded.file_identity(), "task file deferred until the submission settles");
                    self.deferred_config = Some(loaded);
                } else {
                    self.apply_loaded_config(loaded);
                }
            }
            Err(err) => {
                let message = format!("Failed to load {}: {err}", path.display());
                if self.submission.is_busy() {
                    warn!(%message, "config load failed while busy");
                    self.status.set_raw(message);
                } else {
                    self.enter_error(message);
                }
            }
        }
    }

    fn apply_deferred_config(&mut self) {
        if !self.submission.is_busy()
            && let Some(loaded) = self.deferred_config.take()
        {
            self.apply_loaded_config(loaded);
        }
    }

    fn apply_loaded_config(&mut self, loaded: LoadedConfig) {
        let identity = loaded.file_identity();
        let seen = !loaded.file_hash.is_empty()
            && self.services.hash_history.get(&identity).as_deref()
                == Some(loaded.file_hash.as_str());
        self.registry.apply_config(loaded);
        self.validation_hint = None;
        info!(file = %identity, seen, "task file loaded");
        if seen {
            self.status
                .set_raw(format!("Loaded {identity} (submitted before)"));
        } else {
            self.status.set_raw(format!("Loaded {identity}"));
        }
    }

    pub(crate) fn tick(&mut self, now: Instant) {
        if self.double_g.expire(now) {
            debug!("gg window expired");
        }
        if let Some(until) = self.flash_until
            && now >= until
        {
            self.flash_until = None;
            self.status.expire_flash();
        }
    }
}

#[cfg(test)]
impl App {
    pub(crate) fn handle_key_for_test(&mut self, key: KeyEvent) {
        self.handle_key_at(key, Instant::now());
    }

    /// Wait for the next background result and feed it to the controller.
    pub(crate) async fn settle_for_test(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.handle_event(event, Instant::now());
        }
    }

    pub(crate) fn registry_for_test(&self) -> &FieldRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut_for_test(&mut self) -> &mut FieldRegistry {
        &mut self.registry
    }

    pub(crate) fn cursor_for_test(&self) -> FocusCursor {
        self.cursor
    }

    pub(crate) fn set_cursor_for_test(&mut self, cursor: FocusCursor) {
        self.cursor = cursor;
    }

    pub(crate) fn focus_for_test(&self) -> Focus {
        self.focused()
    }

    pub(crate) fn mode_for_test(&self) -> Mode {
        self.mode
    }

    pub(crate) fn submission_for_test(&self) -> &SubmissionState {
        &self.submission
    }

    pub(crate) fn status_for_test(&self) -> &str {
        self.status.message()
    }

    pub(crate) fn validation_hint_for_test(&self) -> Option<&str> {
        self.validation_hint.as_deref()
    }

    pub(crate) fn overlay_active_for_test(&self) -> bool {
        self.overlay.is_some()
    }

    pub(crate) fn outcome_for_test(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn events_sender_for_test(&self) -> UnboundedSender<AppEvent> {
        self.events_tx.clone()
    }

    pub(crate) fn flash_active_for_test(&self) -> bool {
        self.flash_until.is_some()
    }

    pub(crate) fn pending_g_for_test(&self) -> bool {
        self.double_g.is_armed()
    }
}
