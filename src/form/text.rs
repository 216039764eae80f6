use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// An editable string with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
    multiline: bool,
}

impl TextBuffer {
    pub fn single_line() -> Self {
        Self::default()
    }

    pub fn multi_line() -> Self {
        Self {
            multiline: true,
            ..Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the contents and park the cursor at the end.
    pub fn set(&mut self, value: &str) {
        self.text = if self.multiline {
            value.to_string()
        } else {
            value.replace(['\r', '\n'], " ")
        };
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Line and column of the cursor, both zero-based.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let column = before
            .rsplit('\n')
            .next()
            .map(|tail| tail.chars().count())
            .unwrap_or(0);
        (line, column)
    }

    /// Apply an insert-mode key. Returns whether the contents changed.
    ///
    /// Enter is handled by the mode controller, not here, except that it
    /// calls [`TextBuffer::insert_newline`] for multi-line slots.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch) => {
                if key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    return false;
                }
                self.insert_char(ch);
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_len());
                false
            }
            KeyCode::Home => {
                self.cursor = self.line_start(self.cursor);
                false
            }
            KeyCode::End => {
                self.cursor = self.line_end(self.cursor);
                false
            }
            KeyCode::Up if self.multiline => {
                self.move_vertical(-1);
                false
            }
            KeyCode::Down if self.multiline => {
                self.move_vertical(1);
                false
            }
            _ => false,
        }
    }

    pub fn insert_newline(&mut self) -> bool {
        if !self.multiline {
            return false;
        }
        self.insert_char('\n');
        true
    }

    fn insert_char(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
        true
    }

    fn move_vertical(&mut self, delta: i32) {
        let (_, column) = self.cursor_position();
        let start = self.line_start(self.cursor);
        let target_start = if delta < 0 {
            if start == 0 {
                return;
            }
            self.line_start(start - 1)
        } else {
            let end = self.line_end(self.cursor);
            if end >= self.char_len() {
                return;
            }
            end + 1
        };
        let target_end = self.line_end(target_start);
        self.cursor = (target_start + column).min(target_end);
    }

    fn line_start(&self, from: usize) -> usize {
        let chars: Vec<char> = self.text.chars().collect();
        let mut index = from.min(chars.len());
        while index > 0 && chars[index - 1] != '\n' {
            index -= 1;
        }
        index
    }

    fn line_end(&self, from: usize) -> usize {
        let chars: Vec<char> = self.text.chars().collect();
        let mut index = from.min(chars.len());
        while index < chars.len() && chars[index] != '\n' {
            index += 1;
        }
        index
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}
