use std::{
    fs,
    path::{Path, PathBuf},
};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nucleo_matcher::{
    Config, Matcher, Utf32String,
    pattern::{AtomKind, CaseMatching, Normalization, Pattern},
};
use tracing::debug;

use crate::{form::SlotId, presentation::OverlayRender};

pub(crate) const CONFIG_EXTENSIONS: [&str; 4] = ["json", "yaml", "yml", "toml"];

const DIR_ICON: &str = "📁";
const FILE_ICON: &str = "📄";
const PARENT_ICON: &str = "⬆";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub selected: Option<String>,
    pub canceled: bool,
}

impl SelectionResult {
    fn selected(value: impl Into<String>) -> Self {
        Self {
            selected: Some(value.into()),
            canceled: false,
        }
    }

    fn canceled() -> Self {
        Self {
            selected: None,
            canceled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
    Consumed,
    Finished(SelectionResult),
}

/// Full-screen picker that owns every key while it is open.
pub(crate) enum Overlay {
    Fuzzy(FuzzyFinder),
    Files(FileSelector),
}

impl Overlay {
    pub(crate) fn handle(&mut self, key: &KeyEvent) -> OverlayOutcome {
        match self {
            Overlay::Fuzzy(finder) => finder.handle(key),
            Overlay::Files(selector) => selector.handle(key),
        }
    }

    pub(crate) fn as_render(&self) -> OverlayRender<'_> {
        match self {
            Overlay::Fuzzy(finder) => finder.as_render(),
            Overlay::Files(selector) => selector.as_render(),
        }
    }
}

pub(crate) struct FuzzyFinder {
    target: SlotId,
    title: String,
    items: Vec<String>,
    query: String,
    matches: Vec<usize>,
    selected: usize,
    matcher: Matcher,
}

impl FuzzyFinder {
    /// `sources` are consulted in priority order; blanks are skipped and the
    /// first occurrence of a value wins.
    pub(crate) fn new<I, S>(target: SlotId, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items: Vec<String> = Vec::new();
        for source in sources {
            let value = source.as_ref().trim();
            if value.is_empty() || items.iter().any(|item| item == value) {
                continue;
            }
            items.push(value.to_string());
        }
        let matches = (0..items.len()).collect();
        Self {
            target,
            title: format!("Select {}", target.label()),
            items,
            query: String::new(),
            matches,
            selected: 0,
            matcher: Matcher::new(Config::DEFAULT),
        }
    }

    pub(crate) fn target(&self) -> SlotId {
        self.target
    }

    #[cfg(test)]
    pub(crate) fn items(&self) -> &[String] {
        &self.items
    }

    pub(crate) fn visible(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|&index| self.items[index].as_str())
    }

    fn refilter(&mut self) {
        self.selected = 0;
        if self.query.is_empty() {
            self.matches = (0..self.items.len()).collect();
            return;
        }
        let pattern = Pattern::new(
            &self.query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let matcher = &mut self.matcher;
        self.matches = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let haystack = Utf32String::from(item.as_str());
                pattern
                    .score(haystack.slice(..), matcher)
                    .map(|_| index)
            })
            .collect();
    }

    fn handle(&mut self, key: &KeyEvent) -> OverlayOutcome {
        match key.code {
            KeyCode::Esc => return OverlayOutcome::Finished(SelectionResult::canceled()),
            KeyCode::Enter => {
                let choice = self
                    .matches
                    .get(self.selected)
                    .map(|&index| self.items[index].clone())
                    .or_else(|| {
                        let typed = self.query.trim();
                        (!typed.is_empty()).then(|| typed.to_string())
                    });
                let result = match choice {
                    Some(value) => SelectionResult::selected(value),
                    None => SelectionResult::canceled(),
                };
                return OverlayOutcome::Finished(result);
            }
            KeyCode::Up => self.select_previous(),
            KeyCode::Down | KeyCode::Tab => self.select_next(),
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.query.push(ch);
                self.refilter();
            }
            _ => {}
        }
        OverlayOutcome::Consumed
    }

    fn select_previous(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.matches.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn select_next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.matches.len();
    }

    fn as_render(&self) -> OverlayRender<'_> {
        OverlayRender::Fuzzy {
            title: &self.title,
            query: &self.query,
            items: self.visible().collect(),
            selected: self.selected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Parent,
    Directory,
    File,
}

#[derive(Debug, Clone)]
struct FileEntry {
    kind: EntryKind,
    label: String,
}

pub(crate) struct FileSelector {
    dir: PathBuf,
    entries: Vec<FileEntry>,
    selected: usize,
    for_config_load: bool,
    error: Option<String>,
}

impl FileSelector {
    pub(crate) fn new(dir: impl Into<PathBuf>, for_config_load: bool) -> Self {
        let mut selector = Self {
            dir: dir.into(),
            entries: Vec::new(),
            selected: 0,
            for_config_load,
            error: None,
        };
        selector.refresh();
        selector
    }

    pub(crate) fn for_config_load(&self) -> bool {
        self.for_config_load
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    fn refresh(&mut self) {
        self.selected = 0;
        self.entries.clear();
        self.error = None;
        if self.dir.parent().is_some() {
            self.entries.push(FileEntry {
                kind: EntryKind::Parent,
                label: format!("{PARENT_ICON} .."),
            });
        }
        let reader = match fs::read_dir(&self.dir) {
            Ok(reader) => reader,
            Err(err) => {
                debug!(dir = %self.dir.display(), error = %err, "cannot list directory");
                self.error = Some(format!("{}: {err}", self.dir.display()));
                return;
            }
        };
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in reader.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
            if is_dir {
                dirs.push(name);
            } else if !self.for_config_load || is_config_file(&name) {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();
        self.entries.extend(dirs.into_iter().map(|name| FileEntry {
            kind: EntryKind::Directory,
            label: format!("{DIR_ICON} {name}"),
        }));
        self.entries.extend(files.into_iter().map(|name| FileEntry {
            kind: EntryKind::File,
            label: format!("{FILE_ICON} {name}"),
        }));
    }

    fn go_to_parent(&mut self) {
        let parent = self.dir.parent().map(Path::to_path_buf);
        if let Some(parent) = parent {
            self.dir = parent;
            self.refresh();
        }
    }

    fn handle(&mut self, key: &KeyEvent) -> OverlayOutcome {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                return OverlayOutcome::Finished(SelectionResult::canceled());
            }
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => self.go_to_parent(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                let Some(entry) = self.entries.get(self.selected).cloned() else {
                    return OverlayOutcome::Consumed;
                };
                let name = strip_label_glyphs(&entry.label);
                match entry.kind {
                    EntryKind::Parent => self.go_to_parent(),
                    EntryKind::Directory => {
                        self.dir = self.dir.join(name);
                        self.refresh();
                    }
                    EntryKind::File => {
                        let path = self.dir.join(name);
                        return OverlayOutcome::Finished(SelectionResult::selected(
                            path.display().to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
        OverlayOutcome::Consumed
    }

    fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.entries.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.entries.len();
    }

    fn as_render(&self) -> OverlayRender<'_> {
        OverlayRender::Files {
            title: if self.for_config_load {
                "Load task file"
            } else {
                "Select file"
            },
            dir: self.dir.display().to_string(),
            entries: self.labels().collect(),
            selected: self.selected,
            error: self.error.as_deref(),
        }
    }
}

fn is_config_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONFIG_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Drop the selector's own icon and its separating space from a label. The
/// rest is the entry name verbatim, glyphs included.
pub(crate) fn strip_label_glyphs(label: &str) -> &str {
    [PARENT_ICON, DIR_ICON, FILE_ICON]
        .iter()
        .find_map(|icon| label.strip_prefix(icon))
        .and_then(|rest| rest.strip_prefix(' '))
        .unwrap_or(label)
}
