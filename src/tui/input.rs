use crate::util::truncate_runes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Marker drawn at the cursor position of a focused input.
pub const CURSOR_MARKER: char = '|';

/// Single-line editable buffer addressed by rune (char) index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
    width: usize,
    placeholder: String,
}

impl TextInput {
    pub fn new(width: usize, placeholder: &str) -> Self {
        TextInput {
            value: String::new(),
            cursor: 0,
            width: width.max(1),
            placeholder: placeholder.to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Replace the buffer and park the cursor after the last rune.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.rune_count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
        self.clamp_cursor();
    }

    /// Insert text at the cursor and advance past it.
    pub fn insert(&mut self, text: &str) {
        self.clamp_cursor();
        let at = self.byte_offset(self.cursor);
        self.value.insert_str(at, text);
        self.cursor += text.chars().count();
    }

    /// Apply one key press. Returns false for keys an input has no use for,
    /// so the caller can treat them as navigation.
    pub fn update(&mut self, key: KeyEvent) -> bool {
        self.clamp_cursor();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let len = self.rune_count();

        match key.code {
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('b') if ctrl => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Char('f') if ctrl => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Char('e') if ctrl => self.cursor = len,
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let start = self.byte_offset(self.cursor - 1);
                    let end = self.byte_offset(self.cursor);
                    self.value.replace_range(start..end, "");
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let start = self.byte_offset(self.cursor);
                    let end = self.byte_offset(self.cursor + 1);
                    self.value.replace_range(start..end, "");
                }
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut buf = [0u8; 4];
                self.insert(c.encode_utf8(&mut buf));
            }
            _ => return false,
        }
        true
    }

    /// Text to display. Focused inputs show a sliding window with the cursor
    /// marker; unfocused ones show the placeholder or a truncated value.
    pub fn view(&self, focused: bool) -> String {
        if focused {
            return viewport(&self.value, self.cursor, self.width);
        }
        if self.value.trim().is_empty() {
            return truncate_runes(&self.placeholder, self.width);
        }
        truncate_runes(&self.value, self.width)
    }

    /// True when the unfocused view would show the placeholder.
    pub fn shows_placeholder(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn rune_count(&self) -> usize {
        self.value.chars().count()
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.rune_count());
    }

    fn byte_offset(&self, rune_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(rune_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

fn viewport(value: &str, cursor: usize, width: usize) -> String {
    let width = width.max(1);
    let runes: Vec<char> = value.chars().collect();
    let cursor = cursor.min(runes.len());

    // keep one column for the cursor marker
    let visible = width.saturating_sub(1).max(1);
    let start = cursor.saturating_sub(visible);
    let end = (start + visible).min(runes.len());
    let segment = &runes[start..end];
    let pos = (cursor - start).min(segment.len());

    let mut out: String = segment[..pos].iter().collect();
    out.push(CURSOR_MARKER);
    out.extend(segment[pos..].iter());
    truncate_runes(&out, width)
}
