use std::time::{Duration, Instant};

use super::slot::{Focus, SlotId};

/// The `(index, on_submit, on_back)` triple. While either flag is set the
/// index is kept but ignored, so leaving a button restores nothing implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusCursor {
    pub index: usize,
    pub on_submit: bool,
    pub on_back: bool,
}

impl FocusCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `len` is the number of visible data slots and must be supplied fresh
    /// on every call.
    pub fn next(&mut self, len: usize) {
        if self.on_back {
            self.on_back = false;
            self.index = 0;
        } else if self.on_submit {
            self.on_submit = false;
            self.on_back = true;
        } else if self.index + 1 >= len {
            self.on_submit = true;
        } else {
            self.index += 1;
        }
    }

    pub fn prev(&mut self, len: usize) {
        if self.on_back {
            self.on_back = false;
            self.on_submit = true;
        } else if self.on_submit {
            self.on_submit = false;
            self.index = len.saturating_sub(1);
        } else if self.index == 0 {
            self.on_back = true;
        } else {
            self.index = (self.index - 1).min(len.saturating_sub(1));
        }
    }

    pub fn jump_first(&mut self) {
        *self = Self::default();
    }

    pub fn jump_last(&mut self) {
        self.on_submit = true;
        self.on_back = false;
    }

    pub fn focus_slot(&mut self, slots: &[SlotId], slot: SlotId) -> bool {
        let Some(index) = slots.iter().position(|candidate| *candidate == slot) else {
            return false;
        };
        *self = Self {
            index,
            on_submit: false,
            on_back: false,
        };
        true
    }

    pub fn focused(&self, slots: &[SlotId]) -> Focus {
        if self.on_back {
            return Focus::Back;
        }
        if self.on_submit {
            return Focus::Submit;
        }
        match slots.get(self.index) {
            Some(slot) => Focus::Slot(*slot),
            None => slots.last().copied().map(Focus::Slot).unwrap_or(Focus::Submit),
        }
    }

    /// Pull an out-of-range index back onto the last slot.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.on_submit = !self.on_back;
            return;
        }
        if self.index >= len {
            self.index = len - 1;
        }
    }
}

/// Vim-style `gg`: the first press arms a window, a second press inside it
/// fires.
#[derive(Debug, Clone, Copy)]
pub struct DoubleTap {
    window: Duration,
    armed_at: Option<Instant>,
}

impl DoubleTap {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed_at: None,
        }
    }

    /// Returns true when this press completes the sequence.
    pub fn press(&mut self, now: Instant) -> bool {
        match self.armed_at.take() {
            Some(armed) if now.saturating_duration_since(armed) <= self.window => true,
            _ => {
                self.armed_at = Some(now);
                false
            }
        }
    }

    pub fn disarm(&mut self) {
        self.armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Expire the window on tick. Returns true if it was armed and lapsed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.armed_at {
            Some(armed) if now.saturating_duration_since(armed) > self.window => {
                self.armed_at = None;
                true
            }
            _ => false,
        }
    }
}
