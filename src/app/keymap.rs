use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result, anyhow, bail};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use super::input::KeyAction;

macro_rules! keymap_source {
    () => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/keymap/default.keymap.json"
        ))
    };
}

/// Which key table applies. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeymapContext {
    Normal,
    Insert,
    Submitting,
    Duplicate,
    Error,
    Overlay,
}

impl KeymapContext {
    fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "normal" => Some(KeymapContext::Normal),
            "insert" => Some(KeymapContext::Insert),
            "submitting" => Some(KeymapContext::Submitting),
            "duplicate" => Some(KeymapContext::Duplicate),
            "error" => Some(KeymapContext::Error),
            "overlay" => Some(KeymapContext::Overlay),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
    description: String,
    contexts: Vec<String>,
    action: RawAction,
    combos: Vec<String>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum RawAction {
    FocusNext,
    FocusPrev,
    JumpFirst,
    JumpLast,
    EnterInsert,
    ExitInsert,
    InsertEnter,
    Activate,
    FuzzyFind,
    ToggleContext,
    Yank,
    ClearForm,
    Submit,
    Back,
    ResetStatus,
    Cancel,
    Confirm,
    Decline,
    ErrorStep { delta: i32 },
    CopyError,
    DismissError,
    RetryError,
    ForceQuit,
}

impl RawAction {
    fn into_action(self) -> KeyAction {
        match self {
            RawAction::FocusNext => KeyAction::FocusNext,
            RawAction::FocusPrev => KeyAction::FocusPrev,
            RawAction::JumpFirst => KeyAction::JumpFirst,
            RawAction::JumpLast => KeyAction::JumpLast,
            RawAction::EnterInsert => KeyAction::EnterInsert,
            RawAction::ExitInsert => KeyAction::ExitInsert,
            RawAction::InsertEnter => KeyAction::InsertEnter,
            RawAction::Activate => KeyAction::Activate,
            RawAction::FuzzyFind => KeyAction::FuzzyFind,
            RawAction::ToggleContext => KeyAction::ToggleContext,
            RawAction::Yank => KeyAction::Yank,
            RawAction::ClearForm => KeyAction::ClearForm,
            RawAction::Submit => KeyAction::Submit,
            RawAction::Back => KeyAction::Back,
            RawAction::ResetStatus => KeyAction::ResetStatus,
            RawAction::Cancel => KeyAction::Cancel,
            RawAction::Confirm => KeyAction::Confirm,
            RawAction::Decline => KeyAction::Decline,
            RawAction::ErrorStep { delta } => KeyAction::ErrorStep(delta),
            RawAction::CopyError => KeyAction::CopyError,
            RawAction::DismissError => KeyAction::DismissError,
            RawAction::RetryError => KeyAction::RetryError,
            RawAction::ForceQuit => KeyAction::ForceQuit,
        }
    }
}

struct KeyBinding {
    action: KeyAction,
    contexts: Vec<KeymapContext>,
    combos: Vec<KeyPattern>,
    snippet: String,
}

impl KeyBinding {
    fn from_raw(raw: RawEntry) -> Result<Self> {
        let mut contexts = Vec::with_capacity(raw.contexts.len());
        for ctx in &raw.contexts {
            let context = KeymapContext::from_str(ctx)
                .ok_or_else(|| anyhow!("keymap entry {} has unknown context '{ctx}'", raw.id))?;
            contexts.push(context);
        }
        if contexts.is_empty() {
            bail!("keymap entry {} must declare at least one context", raw.id);
        }
        let combos = raw
            .combos
            .iter()
            .map(|combo| {
                KeyPattern::parse(combo)
                    .map_err(|err| anyhow!("failed to parse combo '{combo}' for {}: {err}", raw.id))
            })
            .collect::<Result<Vec<_>>>()?;
        if combos.is_empty() {
            bail!("keymap entry {} must declare combos", raw.id);
        }
        let combos_display = combos
            .iter()
            .map(|pattern| pattern.display.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let snippet = format!("{combos_display} {}", raw.description);
        Ok(Self {
            action: raw.action.into_action(),
            contexts,
            combos,
            snippet,
        })
    }

    fn matches(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        if !self.contexts.contains(&context) {
            return None;
        }
        self.combos
            .iter()
            .any(|pattern| pattern.matches(key))
            .then_some(self.action)
    }
}

struct KeyPattern {
    matcher: CodeMatcher,
    required: KeyModifiers,
    allow_shift: bool,
    display: String,
}

impl KeyPattern {
    fn parse(combo: &str) -> Result<Self, String> {
        let display = combo.trim().to_string();
        if display.is_empty() {
            return Err("combo cannot be empty".into());
        }
        let mut tokens = display
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        let Some(key_token) = tokens.pop() else {
            return Err("combo must contain key".into());
        };
        let matcher = CodeMatcher::from_token(key_token)?;
        let mut required = KeyModifiers::empty();
        for token in tokens {
            match token.to_lowercase().as_str() {
                "ctrl" | "control" => required |= KeyModifiers::CONTROL,
                "shift" => required |= KeyModifiers::SHIFT,
                "alt" => required |= KeyModifiers::ALT,
                other => {
                    return Err(format!("unsupported modifier '{other}'"));
                }
            }
        }
        let allow_shift = matcher.allows_extra_shift() && !required.contains(KeyModifiers::SHIFT);
        Ok(Self {
            matcher,
            required,
            allow_shift,
            display,
        })
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        if !self.matcher.matches(&key.code) {
            return false;
        }
        if !key.modifiers.contains(self.required) {
            return false;
        }
        let extra = key.modifiers - self.required;
        if self.allow_shift {
            (extra - KeyModifiers::SHIFT).is_empty()
        } else {
            extra.is_empty()
        }
    }
}

#[derive(Clone)]
enum CodeMatcher {
    Literal(KeyCode),
    /// Case-sensitive so that `g` and `G` can carry different actions.
    Char(char),
}

impl CodeMatcher {
    fn from_token(token: &str) -> Result<Self, String> {
        let mut chars = token.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Ok(CodeMatcher::Char(ch));
        }
        let matcher = match token.to_lowercase().as_str() {
            "tab" => CodeMatcher::Literal(KeyCode::Tab),
            "backtab" => CodeMatcher::Literal(KeyCode::BackTab),
            "enter" => CodeMatcher::Literal(KeyCode::Enter),
            "esc" | "escape" => CodeMatcher::Literal(KeyCode::Esc),
            "left" => CodeMatcher::Literal(KeyCode::Left),
            "right" => CodeMatcher::Literal(KeyCode::Right),
            "up" => CodeMatcher::Literal(KeyCode::Up),
            "down" => CodeMatcher::Literal(KeyCode::Down),
            "backspace" => CodeMatcher::Literal(KeyCode::Backspace),
            "space" => CodeMatcher::Char(' '),
            _ => return Err(format!("unsupported key '{token}'")),
        };
        Ok(matcher)
    }

    fn matches(&self, code: &KeyCode) -> bool {
        match (self, code) {
            (CodeMatcher::Literal(expected), actual) => actual == expected,
            (CodeMatcher::Char(expected), KeyCode::Char(actual)) => actual == expected,
            _ => false,
        }
    }

    fn allows_extra_shift(&self) -> bool {
        matches!(
            self,
            CodeMatcher::Char(_) | CodeMatcher::Literal(KeyCode::BackTab)
        )
    }
}

/// Parsed key table shared by the router and the help footer.
pub struct KeymapStore {
    bindings: Vec<KeyBinding>,
}

impl std::fmt::Debug for KeymapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeymapStore")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl KeymapStore {
    pub fn from_json(source: &str) -> Result<Self> {
        let raw_entries: Vec<RawEntry> =
            serde_json::from_str(source).context("invalid keymap document")?;
        let bindings = raw_entries
            .into_iter()
            .map(KeyBinding::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bindings })
    }

    pub fn classify(&self, context: KeymapContext, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .iter()
            .find_map(|binding| binding.matches(context, key))
    }

    pub fn help_text(&self, context: KeymapContext) -> Option<String> {
        let snippets = self
            .bindings
            .iter()
            .filter(|binding| binding.contexts.contains(&context))
            .map(|binding| binding.snippet.as_str())
            .collect::<Vec<_>>();
        if snippets.is_empty() {
            None
        } else {
            Some(snippets.join(" • "))
        }
    }
}

static DEFAULT_STORE: LazyLock<Arc<KeymapStore>> = LazyLock::new(|| {
    Arc::new(KeymapStore::from_json(keymap_source!()).expect("invalid keymap/default.keymap.json"))
});

pub fn default_store() -> Arc<KeymapStore> {
    Arc::clone(&DEFAULT_STORE)
}
