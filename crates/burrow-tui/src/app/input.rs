//! Single-line text prompt used for creating and renaming entries.

use crate::event::Key;

/// Editable line with a cursor. The cursor is a char index.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `value` in the buffer and the cursor at its end.
    pub fn with_initial(value: &str) -> Self {
        Self {
            buffer: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(cursor)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Feed one key to the prompt.
    pub fn handle_key(&mut self, key: Key) -> InputResult {
        match key {
            Key::Enter => return InputResult::Submit(self.buffer.clone()),
            Key::Esc => return InputResult::Cancel,

            Key::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            }
            Key::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            }
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(self.len()),
            Key::Home | Key::Ctrl('a') => self.cursor = 0,
            Key::End | Key::Ctrl('e') => self.cursor = self.len(),
            Key::Ctrl('u') => {
                self.buffer.clear();
                self.cursor = 0;
            }
            Key::Ctrl('k') => {
                let at = self.byte_index(self.cursor);
                self.buffer.truncate(at);
            }
            Key::Ctrl('w') => {
                let end = self.byte_index(self.cursor);
                let start = self.buffer[..end]
                    .trim_end()
                    .rfind(' ')
                    .map_or(0, |i| i + 1);
                self.cursor -= self.buffer[start..end].chars().count();
                self.buffer.replace_range(start..end, "");
            }
            Key::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }
}

/// Outcome of a key fed to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Cancel,
    Submit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(input: &mut InputState, text: &str) {
        for c in text.chars() {
            input.handle_key(Key::Char(c));
        }
    }

    #[test]
    fn test_input_basic() {
        let mut input = InputState::new();
        type_str(&mut input, "test");
        assert_eq!(input.buffer(), "test");
        assert_eq!(input.cursor(), 4);
    }

    #[test]
    fn test_input_backspace() {
        let mut input = InputState::with_initial("test");
        input.handle_key(Key::Backspace);
        assert_eq!(input.buffer(), "tes");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn test_input_cursor_movement() {
        let mut input = InputState::with_initial("test");

        input.handle_key(Key::Home);
        assert_eq!(input.cursor(), 0);
        input.handle_key(Key::Left);
        assert_eq!(input.cursor(), 0);

        input.handle_key(Key::End);
        assert_eq!(input.cursor(), 4);
        input.handle_key(Key::Right);
        assert_eq!(input.cursor(), 4);

        input.handle_key(Key::Left);
        input.handle_key(Key::Char('X'));
        assert_eq!(input.buffer(), "tesXt");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = InputState::with_initial("h\u{e9}llo");
        assert_eq!(input.cursor(), 5);
        input.handle_key(Key::Home);
        input.handle_key(Key::Right);
        input.handle_key(Key::Delete);
        assert_eq!(input.buffer(), "hllo");
    }

    #[test]
    fn test_kill_word_and_line() {
        let mut input = InputState::with_initial("new file name");
        input.handle_key(Key::Ctrl('w'));
        assert_eq!(input.buffer(), "new file ");
        assert_eq!(input.cursor(), 9);

        input.handle_key(Key::Ctrl('u'));
        assert_eq!(input.buffer(), "");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = InputState::with_initial("test");
        assert_eq!(input.handle_key(Key::Enter), InputResult::Submit("test".into()));
        assert_eq!(input.handle_key(Key::Esc), InputResult::Cancel);
    }
}
