use std::sync::Arc;

use crossterm::event::KeyEvent;

use super::keymap::{KeymapContext, KeymapStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
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
    ErrorStep(i32),
    CopyError,
    DismissError,
    RetryError,
    ForceQuit,
}

/// What a key means in the active context. Unbound keys in insert mode are
/// text input; everywhere else they are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDispatch {
    Action(KeyAction),
    Text(KeyEvent),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct InputRouter {
    keymap: Arc<KeymapStore>,
}

impl InputRouter {
    pub fn new(keymap: Arc<KeymapStore>) -> Self {
        Self { keymap }
    }

    pub fn classify(&self, context: KeymapContext, key: &KeyEvent) -> KeyDispatch {
        if let Some(action) = self.keymap.classify(context, key) {
            return KeyDispatch::Action(action);
        }
        match context {
            KeymapContext::Insert => KeyDispatch::Text(*key),
            _ => KeyDispatch::Ignored,
        }
    }
}
