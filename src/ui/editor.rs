use crate::ui::input_metrics::clamp_to_char_boundary_left;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single prompt line with a byte cursor and recall of submitted input.
#[derive(Default, Debug)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    stash: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputAction {
    None,
    Submit(String),
    Interrupt,
    Quit,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        if i == 0 {
            return 0;
        }
        clamp_to_char_boundary_left(&self.buffer, i - 1)
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    pub fn insert_str(&mut self, value: &str) {
        self.history_index = None;
        // Prompt is one line; pasted newlines become spaces.
        let value = value.replace(['\r', '\n'], " ");
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, &value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    /// Take the trimmed buffer. Blank input stays in the editor.
    pub fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        self.history.push(value.clone());
        self.history_index = None;
        self.stash = None;
        self.buffer.clear();
        self.cursor = 0;
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index.is_none() {
            self.stash = Some(self.buffer.clone());
        }
        let next = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(next);
        self.buffer = self.history[next].clone();
        self.cursor = self.buffer.len();
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 >= self.history.len() {
            self.history_index = None;
            self.buffer = self.stash.take().unwrap_or_default();
        } else {
            self.history_index = Some(idx + 1);
            self.buffer = self.history[idx + 1].clone();
        }
        self.cursor = self.buffer.len();
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> InputAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return InputAction::Interrupt,
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    return InputAction::Quit;
                }
                self.delete();
            }
            KeyCode::Char('u') if ctrl => {
                self.buffer.clear();
                self.cursor = 0;
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return InputAction::Submit(value);
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert_str(ch.encode_utf8(&mut [0; 4]));
            }
            _ => {}
        }
        InputAction::None
    }
}
