//! Global settings, per-repository environment variables and SSH info.

use crate::store::{SettingRecord, SettingScope};
use crate::tui::form::{Form, FormEffect, KeyValueEntry, ValueType};
use crate::tui::message::{Command, Reply};
use crate::tui::theme::Theme;
use crate::util::cycle_index;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use std::env;
use tracing::{debug, warn};

pub const LOG_RETENTION_KEY: &str = "log_retention_days";
const LOG_RETENTION_LABEL: &str = "Log Retention Days";
const DEFAULT_LOG_RETENTION_DAYS: i64 = 3;
const VALUE_WIDTH: usize = 36;
const DEFAULT_SSH_COMMAND: &str = "ssh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Global,
    EnvVars,
    Ssh,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 3] = [
        SettingsSection::Global,
        SettingsSection::EnvVars,
        SettingsSection::Ssh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsSection::Global => "Global",
            SettingsSection::EnvVars => "Env Vars",
            SettingsSection::Ssh => "SSH",
        }
    }

    fn index(self) -> usize {
        SettingsSection::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFocus {
    Sections,
    Editor,
}

/// Read-only view of the SSH command git will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshViewer {
    command: String,
    from_env: bool,
}

impl SshViewer {
    pub fn new(git_ssh_command: Option<String>) -> Self {
        match git_ssh_command.filter(|c| !c.trim().is_empty()) {
            Some(command) => SshViewer {
                command,
                from_env: true,
            },
            None => SshViewer {
                command: DEFAULT_SSH_COMMAND.to_string(),
                from_env: false,
            },
        }
    }

    pub fn from_env() -> Self {
        SshViewer::new(env::var("GIT_SSH_COMMAND").ok())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let source = if self.from_env {
            "from GIT_SSH_COMMAND"
        } else {
            "default"
        };
        vec![
            Line::from(vec![
                Span::styled("git ssh command: ", theme.muted()),
                Span::styled(self.command.clone(), theme.text_style()),
                Span::styled(format!("  ({})", source), theme.muted()),
            ]),
            Line::default(),
            Line::from(Span::styled(
                "Set GIT_SSH_COMMAND before starting the console to use another key.",
                theme.muted(),
            )),
            Line::from(Span::styled(
                "Private repositories need a key the ssh agent can offer to GitHub.",
                theme.muted(),
            )),
        ]
    }
}

pub struct SettingsPanel {
    repo: Option<String>,
    section: SettingsSection,
    focus: SettingsFocus,
    global_form: Form,
    retention_days: i64,
    env_form: Form,
    /// Env vars the store has confirmed for `repo`.
    env_vars: Vec<(String, String)>,
    ssh: SshViewer,
    status: Option<(String, bool)>,
}

impl SettingsPanel {
    pub fn new(ssh: SshViewer) -> Self {
        SettingsPanel {
            repo: None,
            section: SettingsSection::Global,
            focus: SettingsFocus::Sections,
            global_form: global_form(DEFAULT_LOG_RETENTION_DAYS),
            retention_days: DEFAULT_LOG_RETENTION_DAYS,
            env_form: Form::new(Vec::new(), VALUE_WIDTH, true),
            env_vars: Vec::new(),
            ssh,
            status: None,
        }
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    pub fn section(&self) -> SettingsSection {
        self.section
    }

    pub fn focus(&self) -> SettingsFocus {
        self.focus
    }

    pub fn retention_days(&self) -> i64 {
        self.retention_days
    }

    pub fn global_form(&self) -> &Form {
        &self.global_form
    }

    pub fn env_form(&self) -> &Form {
        &self.env_form
    }

    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env_vars
    }

    pub fn ssh(&self) -> &SshViewer {
        &self.ssh
    }

    pub fn status(&self) -> Option<&(String, bool)> {
        self.status.as_ref()
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status = Some((msg.into(), is_error));
    }

    /// Switch to `repo` and load both the repo-scoped and global buckets.
    pub fn select_repo(&mut self, repo: Option<&str>) -> Vec<Command> {
        self.repo = repo.map(str::to_string);
        self.section = SettingsSection::Global;
        self.focus = SettingsFocus::Sections;
        self.env_vars.clear();
        self.env_form = Form::new(Vec::new(), VALUE_WIDTH, true);
        self.global_form = global_form(self.retention_days);
        self.status = None;

        match repo {
            Some(repo) => vec![
                Command::ListSettings(SettingScope::Repo(repo.to_string())),
                Command::ListSettings(SettingScope::Global),
            ],
            None => Vec::new(),
        }
    }

    fn active_form(&self) -> Option<&Form> {
        match self.section {
            SettingsSection::Global => Some(&self.global_form),
            SettingsSection::EnvVars => Some(&self.env_form),
            SettingsSection::Ssh => None,
        }
    }

    fn is_editing(&self) -> bool {
        self.active_form().is_some_and(Form::is_editing)
    }

    pub fn update_key(&mut self, key: KeyEvent) -> Reply {
        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            if !(self.focus == SettingsFocus::Editor && self.is_editing()) {
                self.focus = match self.focus {
                    SettingsFocus::Sections => SettingsFocus::Editor,
                    SettingsFocus::Editor => SettingsFocus::Sections,
                };
            }
            return Reply::consumed();
        }

        match self.focus {
            SettingsFocus::Sections => self.update_sections(key),
            SettingsFocus::Editor => self.update_editor(key),
        }
    }

    fn update_sections(&mut self, key: KeyEvent) -> Reply {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Reply::ignored();
        }
        let len = SettingsSection::ALL.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                let idx = cycle_index(self.section.index(), len, -1);
                self.section = SettingsSection::ALL[idx];
                Reply::consumed()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let idx = cycle_index(self.section.index(), len, 1);
                self.section = SettingsSection::ALL[idx];
                Reply::consumed()
            }
            KeyCode::Enter => {
                self.focus = SettingsFocus::Editor;
                Reply::consumed()
            }
            _ => Reply::ignored(),
        }
    }

    fn update_editor(&mut self, key: KeyEvent) -> Reply {
        let (handled, command) = match self.section {
            SettingsSection::Global => {
                let (handled, effect) = self.global_form.update(key);
                (handled, effect.and_then(global_command))
            }
            SettingsSection::EnvVars => {
                let (handled, effect) = self.env_form.update(key);
                let command = match (effect, &self.repo) {
                    (Some(effect), Some(repo)) => Some(env_command(repo, effect)),
                    _ => None,
                };
                (handled, command)
            }
            SettingsSection::Ssh => (false, None),
        };
        Reply {
            handled,
            commands: command.into_iter().collect(),
            open_repo: None,
        }
    }

    pub fn on_settings_loaded(&mut self, scope: &SettingScope, result: Result<Vec<SettingRecord>>) {
        match scope {
            SettingScope::Global => match result {
                Ok(records) => self.apply_global(&records),
                Err(err) => self.set_status(format!("Failed to load global settings: {}", err), true),
            },
            SettingScope::Repo(repo) => {
                if self.repo.as_deref() != Some(repo.as_str()) {
                    debug!(repo = %repo, "discarding stale settings");
                    return;
                }
                match result {
                    Ok(records) => {
                        self.env_vars = records.into_iter().map(|r| (r.key, r.value)).collect();
                        self.rebuild_env_form();
                    }
                    Err(err) => self.set_status(format!("Failed to load env vars: {}", err), true),
                }
            }
        }
    }

    fn apply_global(&mut self, records: &[SettingRecord]) {
        let Some(record) = records.iter().find(|r| r.key == LOG_RETENTION_KEY) else {
            return;
        };
        match record.value.trim().parse::<i64>() {
            Ok(days) => {
                self.retention_days = days;
                self.global_form
                    .set_value(LOG_RETENTION_LABEL, &days.to_string());
            }
            Err(_) => {
                warn!(value = %record.value, "unparseable global setting");
                self.set_status(
                    format!("Invalid global setting value for {}", LOG_RETENTION_KEY),
                    true,
                );
            }
        }
    }

    pub fn on_setting_saved(
        &mut self,
        scope: &SettingScope,
        key: &str,
        value: &str,
        result: &Result<()>,
    ) {
        match scope {
            SettingScope::Global => match result {
                Ok(()) => {
                    if key == LOG_RETENTION_KEY {
                        if let Ok(days) = value.parse::<i64>() {
                            self.retention_days = days;
                        }
                    }
                    self.set_status(format!("Saved global setting {}", key), false);
                }
                Err(err) => {
                    self.set_status(format!("Failed to save global setting: {}", err), true);
                    let days = self.retention_days.to_string();
                    self.global_form.set_value(LOG_RETENTION_LABEL, &days);
                }
            },
            SettingScope::Repo(repo) => {
                if self.repo.as_deref() != Some(repo.as_str()) {
                    debug!(repo = %repo, "discarding stale setting save");
                    return;
                }
                match result {
                    Ok(()) => {
                        match self.env_vars.iter_mut().find(|(k, _)| k == key) {
                            Some(entry) => entry.1 = value.to_string(),
                            None => self.env_vars.push((key.to_string(), value.to_string())),
                        }
                        self.env_form
                            .ensure_entry(KeyValueEntry::new(key, value, ValueType::String));
                        self.set_status(format!("Saved {}", key), false);
                    }
                    Err(err) => {
                        self.set_status(format!("Failed to save {}: {}", key, err), true);
                        self.rebuild_env_form();
                    }
                }
            }
        }
    }

    pub fn on_setting_deleted(&mut self, scope: &SettingScope, key: &str, result: &Result<()>) {
        let SettingScope::Repo(repo) = scope else {
            if let Err(err) = result {
                self.set_status(format!("Failed to delete global setting: {}", err), true);
            }
            return;
        };
        if self.repo.as_deref() != Some(repo.as_str()) {
            debug!(repo = %repo, "discarding stale setting delete");
            return;
        }
        match result {
            Ok(()) => {
                self.env_vars.retain(|(k, _)| k != key);
                self.env_form.remove_entry(key);
                self.set_status(format!("Deleted {}", key), false);
            }
            Err(err) => {
                self.set_status(format!("Failed to delete {}: {}", key, err), true);
                self.rebuild_env_form();
            }
        }
    }

    fn rebuild_env_form(&mut self) {
        let entries = self
            .env_vars
            .iter()
            .map(|(k, v)| KeyValueEntry::new(k, v, ValueType::String))
            .collect();
        self.env_form.set_entries(entries);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(18), Constraint::Min(0)])
            .split(rows[0]);

        let sections_focused = self.focus == SettingsFocus::Sections;
        let items: Vec<ListItem> = SettingsSection::ALL
            .iter()
            .map(|section| {
                let style = if *section == self.section {
                    theme.selected(sections_focused)
                } else {
                    theme.text_style()
                };
                ListItem::new(Span::styled(format!(" {}", section.label()), style))
            })
            .collect();
        let list = List::new(items).block(theme.panel_block("Sections", sections_focused));
        f.render_widget(list, cols[0]);

        let editor_focused = self.focus == SettingsFocus::Editor;
        let block = theme.panel_block(self.section.label(), editor_focused);
        let inner = block.inner(cols[1]);
        f.render_widget(block, cols[1]);
        match self.section {
            SettingsSection::Global => self.global_form.render(f, inner, theme, editor_focused),
            SettingsSection::EnvVars => self.env_form.render(f, inner, theme, editor_focused),
            SettingsSection::Ssh => {
                let para = Paragraph::new(self.ssh.lines(theme)).wrap(Wrap { trim: false });
                f.render_widget(para, inner);
            }
        }

        let footer = match &self.status {
            Some((msg, is_error)) => {
                Line::from(Span::styled(msg.clone(), theme.status(*is_error)))
            }
            None => Line::from(theme.hint("tab", "sections/editor")),
        };
        f.render_widget(Paragraph::new(footer), rows[1]);
    }
}

fn global_form(retention_days: i64) -> Form {
    Form::new(
        vec![KeyValueEntry::new(
            LOG_RETENTION_LABEL,
            &retention_days.to_string(),
            ValueType::Int,
        )],
        VALUE_WIDTH,
        false,
    )
}

fn global_command(effect: FormEffect) -> Option<Command> {
    match effect {
        FormEffect::Changed(entry) if entry.key == LOG_RETENTION_LABEL => {
            Some(Command::SaveSetting {
                scope: SettingScope::Global,
                key: LOG_RETENTION_KEY.to_string(),
                value: entry.value,
            })
        }
        _ => None,
    }
}

fn env_command(repo: &str, effect: FormEffect) -> Command {
    let scope = SettingScope::Repo(repo.to_string());
    match effect {
        FormEffect::Added(entry) | FormEffect::Changed(entry) => Command::SaveSetting {
            scope,
            key: entry.key,
            value: entry.value,
        },
        FormEffect::Deleted(entry) => Command::DeleteSetting {
            scope,
            key: entry.key,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_text(panel: &mut SettingsPanel, text: &str) {
        for c in text.chars() {
            panel.update_key(key(KeyCode::Char(c)));
        }
    }

    fn record(repo: &str, key: &str, value: &str) -> SettingRecord {
        SettingRecord {
            repo: repo.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn repo_scope() -> SettingScope {
        SettingScope::Repo("acme/api".to_string())
    }

    fn panel() -> SettingsPanel {
        let mut panel = SettingsPanel::new(SshViewer::new(None));
        panel.select_repo(Some("acme/api"));
        panel
    }

    fn open_env_editor(panel: &mut SettingsPanel) {
        panel.update_key(key(KeyCode::Down));
        assert_eq!(panel.section(), SettingsSection::EnvVars);
        panel.update_key(key(KeyCode::Enter));
        assert_eq!(panel.focus(), SettingsFocus::Editor);
    }

    #[test]
    fn select_repo_loads_both_scopes() {
        let mut panel = SettingsPanel::new(SshViewer::new(None));
        assert_eq!(
            panel.select_repo(Some("acme/api")),
            vec![
                Command::ListSettings(repo_scope()),
                Command::ListSettings(SettingScope::Global),
            ]
        );
    }

    #[test]
    fn global_value_is_parsed_as_integer() {
        let mut panel = panel();
        panel.on_settings_loaded(
            &SettingScope::Global,
            Ok(vec![record("global_sys", LOG_RETENTION_KEY, " 14 ")]),
        );
        assert_eq!(panel.retention_days(), 14);
        assert_eq!(panel.global_form().entries()[0].value, "14");
    }

    #[test]
    fn invalid_global_value_keeps_previous() {
        let mut panel = panel();
        panel.on_settings_loaded(
            &SettingScope::Global,
            Ok(vec![record("global_sys", LOG_RETENTION_KEY, "7")]),
        );
        panel.on_settings_loaded(
            &SettingScope::Global,
            Ok(vec![record("global_sys", LOG_RETENTION_KEY, "seven")]),
        );
        assert_eq!(panel.retention_days(), 7);
        assert_eq!(panel.global_form().entries()[0].value, "7");
        assert_eq!(
            panel.status(),
            Some(&(
                "Invalid global setting value for log_retention_days".to_string(),
                true
            ))
        );
    }

    #[test]
    fn editing_global_value_issues_save() {
        let mut panel = panel();
        panel.update_key(key(KeyCode::Tab));
        panel.update_key(key(KeyCode::Char('e')));
        panel.update_key(key(KeyCode::Backspace));
        type_text(&mut panel, "30");
        let reply = panel.update_key(key(KeyCode::Enter));
        assert_eq!(
            reply.commands,
            vec![Command::SaveSetting {
                scope: SettingScope::Global,
                key: LOG_RETENTION_KEY.to_string(),
                value: "30".to_string(),
            }]
        );
    }

    #[test]
    fn failed_global_save_reverts_form() {
        let mut panel = panel();
        panel.update_key(key(KeyCode::Tab));
        panel.update_key(key(KeyCode::Char('e')));
        panel.update_key(key(KeyCode::Backspace));
        type_text(&mut panel, "30");
        panel.update_key(key(KeyCode::Enter));
        assert_eq!(panel.global_form().entries()[0].value, "30");

        panel.on_setting_saved(
            &SettingScope::Global,
            LOG_RETENTION_KEY,
            "30",
            &Err(anyhow::anyhow!("disk full")),
        );
        assert_eq!(panel.global_form().entries()[0].value, "3");
        assert_eq!(panel.retention_days(), 3);
    }

    #[test]
    fn env_vars_mirror_repo_scope() {
        let mut panel = panel();
        panel.on_settings_loaded(&repo_scope(), Ok(vec![record("acme/api", "TOKEN", "x")]));
        assert_eq!(panel.env_form().entries().len(), 1);

        open_env_editor(&mut panel);
        panel.update_key(key(KeyCode::Char('a')));
        type_text(&mut panel, "REGION");
        panel.update_key(key(KeyCode::Enter));
        type_text(&mut panel, "eu");
        let reply = panel.update_key(key(KeyCode::Enter));
        assert_eq!(
            reply.commands,
            vec![Command::SaveSetting {
                scope: repo_scope(),
                key: "REGION".to_string(),
                value: "eu".to_string(),
            }]
        );
        panel.on_setting_saved(&repo_scope(), "REGION", "eu", &Ok(()));
        assert_eq!(panel.env_vars().len(), 2);

        let reply = panel.update_key(key(KeyCode::Char('d')));
        assert_eq!(
            reply.commands,
            vec![Command::DeleteSetting {
                scope: repo_scope(),
                key: "REGION".to_string(),
            }]
        );
    }

    #[test]
    fn stale_repo_settings_are_discarded() {
        let mut panel = panel();
        panel.on_settings_loaded(
            &SettingScope::Repo("acme/web".to_string()),
            Ok(vec![record("acme/web", "TOKEN", "x")]),
        );
        assert!(panel.env_form().entries().is_empty());
        assert!(panel.env_vars().is_empty());
    }

    #[test]
    fn failed_env_delete_restores_entry() {
        let mut panel = panel();
        panel.on_settings_loaded(&repo_scope(), Ok(vec![record("acme/api", "TOKEN", "x")]));
        open_env_editor(&mut panel);
        panel.update_key(key(KeyCode::Char('d')));
        assert!(panel.env_form().entries().is_empty());
        panel.on_setting_deleted(&repo_scope(), "TOKEN", &Err(anyhow::anyhow!("nope")));
        assert_eq!(panel.env_form().entries().len(), 1);
        assert_eq!(panel.status().map(|s| s.1), Some(true));
    }

    #[test]
    fn env_save_confirmed_after_failed_delete_returns_to_form() {
        let mut panel = panel();
        panel.on_settings_loaded(&repo_scope(), Ok(vec![record("acme/api", "TOKEN", "x")]));
        open_env_editor(&mut panel);
        panel.update_key(key(KeyCode::Char('a')));
        type_text(&mut panel, "REGION");
        panel.update_key(key(KeyCode::Enter));
        type_text(&mut panel, "eu");
        panel.update_key(key(KeyCode::Enter));

        panel.update_key(key(KeyCode::Up));
        let reply = panel.update_key(key(KeyCode::Char('d')));
        assert_eq!(
            reply.commands,
            vec![Command::DeleteSetting {
                scope: repo_scope(),
                key: "TOKEN".to_string(),
            }]
        );

        panel.on_setting_deleted(&repo_scope(), "TOKEN", &Err(anyhow::anyhow!("nope")));
        panel.on_setting_saved(&repo_scope(), "REGION", "eu", &Ok(()));

        let shown: Vec<(&str, &str)> = panel
            .env_form()
            .entries()
            .iter()
            .map(|e| (e.key.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(shown, vec![("TOKEN", "x"), ("REGION", "eu")]);
        assert_eq!(panel.env_vars().len(), 2);
    }

    #[test]
    fn env_delete_confirmed_after_failed_save_leaves_form() {
        let mut panel = panel();
        panel.on_settings_loaded(
            &repo_scope(),
            Ok(vec![record("acme/api", "TOKEN", "x"), record("acme/api", "REGION", "eu")]),
        );
        open_env_editor(&mut panel);
        panel.update_key(key(KeyCode::Char('d')));
        panel.update_key(key(KeyCode::Char('e')));
        type_text(&mut panel, "2");
        panel.update_key(key(KeyCode::Enter));

        panel.on_setting_saved(&repo_scope(), "REGION", "eu2", &Err(anyhow::anyhow!("nope")));
        assert_eq!(panel.env_form().entries().len(), 2);
        panel.on_setting_deleted(&repo_scope(), "TOKEN", &Ok(()));

        let shown: Vec<&str> = panel.env_form().entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(shown, vec!["REGION"]);
        assert_eq!(panel.env_form().entries()[0].value, "eu");
    }

    #[test]
    fn tab_cannot_leave_editor_mid_edit() {
        let mut panel = panel();
        panel.update_key(key(KeyCode::Tab));
        panel.update_key(key(KeyCode::Char('e')));
        assert!(panel.update_key(key(KeyCode::Tab)).handled);
        assert_eq!(panel.focus(), SettingsFocus::Editor);
        panel.update_key(key(KeyCode::Esc));
        panel.update_key(key(KeyCode::Tab));
        assert_eq!(panel.focus(), SettingsFocus::Sections);
    }

    #[test]
    fn section_navigation_wraps() {
        let mut panel = panel();
        panel.update_key(key(KeyCode::Up));
        assert_eq!(panel.section(), SettingsSection::Ssh);
        panel.update_key(key(KeyCode::Char('j')));
        assert_eq!(panel.section(), SettingsSection::Global);
    }

    #[test]
    fn ssh_section_consumes_no_keys() {
        let mut panel = panel();
        panel.update_key(key(KeyCode::Up));
        panel.update_key(key(KeyCode::Enter));
        assert!(!panel.update_key(key(KeyCode::Char('e'))).handled);
        assert!(!panel.update_key(key(KeyCode::Esc)).handled);
    }

    #[test]
    fn ssh_viewer_prefers_environment_command() {
        assert_eq!(SshViewer::new(None).command(), "ssh");
        assert_eq!(SshViewer::new(Some("  ".to_string())).command(), "ssh");
        assert_eq!(
            SshViewer::new(Some("ssh -i ~/.ssh/ci".to_string())).command(),
            "ssh -i ~/.ssh/ci"
        );
    }
}
