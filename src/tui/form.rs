//! Editable key/value list with a modal add/edit/delete state machine.

use crate::tui::error::ValidationError;
use crate::tui::input::TextInput;
use crate::tui::theme::Theme;
use crate::util::{cycle_index, pad_columns, truncate_runes};
use chrono::{DateTime, NaiveDate, SecondsFormat};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

const KEY_WIDTH: usize = 22;

/// How an entry's value is validated and canonicalized on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Int,
    Bool,
    Date,
    /// Unrecognized type tag; the value passes through unchanged.
    Opaque,
}

impl From<&str> for ValueType {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "" | "string" => ValueType::String,
            "int" | "integer" | "number" => ValueType::Int,
            "bool" | "boolean" => ValueType::Bool,
            "date" => ValueType::Date,
            _ => ValueType::Opaque,
        }
    }
}

/// Validate `raw` for `value_type` and return its canonical text.
pub fn sanitize_value(value_type: ValueType, raw: &str) -> Result<String, ValidationError> {
    match value_type {
        ValueType::String | ValueType::Opaque => Ok(raw.to_string()),
        ValueType::Int => raw
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| ValidationError::NotInteger),
        ValueType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok("true".to_string()),
            "false" | "0" | "no" | "n" | "off" => Ok("false".to_string()),
            _ => Err(ValidationError::NotBool),
        },
        ValueType::Date => {
            let s = raw.trim();
            if s.is_empty() {
                return Err(ValidationError::EmptyDate);
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(date.format("%Y-%m-%d").to_string());
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Ok(ts.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            Err(ValidationError::NotDate)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: String,
    pub value_type: ValueType,
}

impl KeyValueEntry {
    pub fn new(key: &str, value: &str, value_type: ValueType) -> Self {
        KeyValueEntry {
            key: key.to_string(),
            value: value.to_string(),
            value_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Browse,
    EditValue,
    AddKey,
    AddValue,
}

/// Side effect requested by a committed form change. The owner decides what
/// store call, if any, it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    Changed(KeyValueEntry),
    Added(KeyValueEntry),
    Deleted(KeyValueEntry),
}

#[derive(Debug, Clone)]
pub struct Form {
    entries: Vec<KeyValueEntry>,
    selected: usize,
    value_width: usize,
    editable: bool,
    mode: FormMode,
    input: TextInput,
    draft_key: String,
    status: Option<(String, bool)>,
}

impl Form {
    pub fn new(entries: Vec<KeyValueEntry>, value_width: usize, editable: bool) -> Self {
        Form {
            entries,
            selected: 0,
            value_width: value_width.max(1),
            editable,
            mode: FormMode::Browse,
            input: TextInput::new(value_width, ""),
            draft_key: String::new(),
            status: None,
        }
    }

    pub fn entries(&self) -> &[KeyValueEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn draft_key(&self) -> &str {
        &self.draft_key
    }

    pub fn status(&self) -> Option<&(String, bool)> {
        self.status.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.mode != FormMode::Browse
    }

    pub fn set_status(&mut self, msg: &str, is_error: bool) {
        self.status = Some((msg.to_string(), is_error));
    }

    /// Replace every entry. An in-progress value edit is abandoned since the
    /// row it targeted may be gone; a draft being added survives.
    pub fn set_entries(&mut self, entries: Vec<KeyValueEntry>) {
        self.entries = entries;
        if self.mode == FormMode::EditValue {
            self.reset_to_browse();
        }
        self.clamp_selection();
    }

    /// Overwrite the value of the entry named `key`, if present.
    pub fn set_value(&mut self, key: &str, value: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Append `entry` unless its key is already listed. Returns whether it was added.
    pub fn ensure_entry(&mut self, entry: KeyValueEntry) -> bool {
        if self.entries.iter().any(|e| e.key == entry.key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Drop the entry named `key`, keeping the selection on the same row.
    /// An edit of the removed row is abandoned.
    pub fn remove_entry(&mut self, key: &str) -> bool {
        let Some(idx) = self.entries.iter().position(|e| e.key == key) else {
            return false;
        };
        if self.mode == FormMode::EditValue && idx == self.selected {
            self.reset_to_browse();
        }
        self.entries.remove(idx);
        if idx < self.selected {
            self.selected -= 1;
        }
        self.clamp_selection();
        true
    }

    /// Apply a key press. Returns whether the key was consumed and the side
    /// effect of any committed change.
    pub fn update(&mut self, key: KeyEvent) -> (bool, Option<FormEffect>) {
        if self.mode != FormMode::Browse {
            return self.update_input_mode(key);
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return (false, None);
        }

        match key.code {
            KeyCode::Up if !self.entries.is_empty() => {
                self.selected = cycle_index(self.selected, self.entries.len(), -1);
                (true, None)
            }
            KeyCode::Down if !self.entries.is_empty() => {
                self.selected = cycle_index(self.selected, self.entries.len(), 1);
                (true, None)
            }
            KeyCode::Char('e') if !self.entries.is_empty() => {
                self.clamp_selection();
                self.mode = FormMode::EditValue;
                self.input.set_width(self.value_width);
                let current = self.entries[self.selected].value.clone();
                self.input.set_value(&current);
                (true, None)
            }
            KeyCode::Char('a') if self.editable => {
                self.mode = FormMode::AddKey;
                self.input.set_width(KEY_WIDTH);
                self.input.clear();
                self.draft_key.clear();
                (true, None)
            }
            KeyCode::Char('d') if self.editable => (true, self.delete_at_selection()),
            _ => (false, None),
        }
    }

    fn update_input_mode(&mut self, key: KeyEvent) -> (bool, Option<FormEffect>) {
        match key.code {
            KeyCode::Esc => {
                self.reset_to_browse();
                (true, None)
            }
            KeyCode::Enter => (true, self.commit_input()),
            _ => (self.input.update(key), None),
        }
    }

    fn commit_input(&mut self) -> Option<FormEffect> {
        let raw = self.input.value().to_string();

        match self.mode {
            FormMode::Browse => None,
            FormMode::EditValue => {
                let entry = self.entries.get_mut(self.selected)?;
                match sanitize_value(entry.value_type, &raw) {
                    Ok(value) => {
                        entry.value = value;
                        let changed = entry.clone();
                        self.status = Some((format!("Updated value: {}", changed.key), false));
                        self.reset_to_browse();
                        Some(FormEffect::Changed(changed))
                    }
                    Err(err) => {
                        self.status =
                            Some((format!("Invalid value for {}: {}", entry.key, err), true));
                        None
                    }
                }
            }
            FormMode::AddKey => {
                let key = raw.trim();
                if key.is_empty() {
                    self.set_status(&ValidationError::EmptyKey.to_string(), true);
                    return None;
                }
                if self.has_duplicate_key(key) {
                    self.set_status(&ValidationError::DuplicateKey.to_string(), true);
                    return None;
                }
                self.draft_key = key.to_string();
                self.input.set_width(self.value_width);
                self.input.clear();
                self.mode = FormMode::AddValue;
                self.status = None;
                None
            }
            FormMode::AddValue => match sanitize_value(ValueType::String, &raw) {
                Ok(value) => {
                    let entry = KeyValueEntry::new(&self.draft_key, &value, ValueType::String);
                    self.entries.push(entry.clone());
                    self.selected = self.entries.len() - 1;
                    self.set_status("Added new entry.", false);
                    self.reset_to_browse();
                    Some(FormEffect::Added(entry))
                }
                Err(err) => {
                    self.status = Some((format!("Invalid value: {}", err), true));
                    None
                }
            },
        }
    }

    fn delete_at_selection(&mut self) -> Option<FormEffect> {
        if self.entries.is_empty() {
            self.set_status("No entry to delete.", true);
            return None;
        }
        self.clamp_selection();
        let deleted = self.entries.remove(self.selected);
        if self.selected >= self.entries.len() && self.selected > 0 {
            self.selected -= 1;
        }
        self.status = Some((format!("Deleted: {}", deleted.key), false));
        Some(FormEffect::Deleted(deleted))
    }

    fn has_duplicate_key(&self, key: &str) -> bool {
        let key = key.trim().to_lowercase();
        self.entries
            .iter()
            .any(|e| e.key.trim().to_lowercase() == key)
    }

    fn reset_to_browse(&mut self) {
        self.mode = FormMode::Browse;
        self.input.clear();
        self.draft_key.clear();
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
    }

    pub fn help_text(&self) -> &'static str {
        match self.mode {
            FormMode::Browse if self.editable => "[up/down] [e]dit-value [a]dd [d]elete",
            FormMode::Browse => "[up/down] [e]dit",
            FormMode::EditValue => "Editing value: [left/right]move [enter]save [esc]cancel",
            FormMode::AddKey => "Adding entry key: [left/right]move [enter]to val [esc]cancel",
            FormMode::AddValue => "Adding entry value: [left/right]move [enter]save [esc]cancel",
        }
    }

    pub fn lines(&self, theme: &Theme, focused: bool) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let row_selected = i == self.selected;
            let value = if row_selected && self.mode == FormMode::EditValue {
                Some(self.input.view(true))
            } else {
                None
            };
            lines.push(self.row(theme, &entry.key, value, &entry.value, row_selected, focused));
        }

        if self.entries.is_empty() {
            lines.push(Line::from(Span::styled("No entries yet.", theme.muted())));
        }

        match self.mode {
            FormMode::AddKey => {
                let label = self.input.view(true);
                lines.push(self.row(theme, &label, None, "", true, focused));
            }
            FormMode::AddValue => {
                let value = self.input.view(true);
                let key = self.draft_key.clone();
                lines.push(self.row(theme, &key, Some(value), "", true, focused));
            }
            FormMode::Browse | FormMode::EditValue => {}
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(self.help_text(), theme.muted())));

        if let Some((msg, is_error)) = &self.status {
            lines.push(Line::from(Span::styled(msg.clone(), theme.status(*is_error))));
        }
        lines
    }

    fn row(
        &self,
        theme: &Theme,
        label: &str,
        editing: Option<String>,
        value: &str,
        selected: bool,
        focused: bool,
    ) -> Line<'static> {
        let prefix = if selected && focused { "▶ " } else { "  " };
        let label = pad_columns(&truncate_runes(label, KEY_WIDTH), KEY_WIDTH);
        let value_span = match editing {
            Some(view) => Span::styled(view, theme.selected(true)),
            None if value.trim().is_empty() => Span::styled("not set", theme.placeholder()),
            None => Span::styled(
                truncate_runes(value, self.value_width),
                if selected {
                    theme.selected(focused)
                } else {
                    theme.text_style()
                },
            ),
        };
        Line::from(vec![
            Span::styled(prefix, theme.title()),
            Span::styled(format!("{}: ", label), theme.muted()),
            value_span,
        ])
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme, focused: bool) {
        let para = Paragraph::new(self.lines(theme, focused)).wrap(Wrap { trim: false });
        f.render_widget(para, area);
    }
}
