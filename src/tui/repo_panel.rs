//! Repository list with the add-by-URL input.

use crate::git;
use crate::store::RepoRecord;
use crate::tui::error::ValidationError;
use crate::tui::input::TextInput;
use crate::tui::message::{Command, Reply};
use crate::tui::theme::Theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};
use ratatui::Frame;
use tracing::{debug, info};

const URL_PLACEHOLDER: &str = "https://github.com/owner/repo.git";
const URL_PREFIXES: [&str; 3] = ["http://", "https://", "git@"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoFocus {
    Input,
    List,
}

pub struct RepoPanel {
    input: TextInput,
    repos: Vec<RepoRecord>,
    selected: usize,
    focus: RepoFocus,
    cloning: bool,
    loaded: bool,
    status: Option<(String, bool)>,
}

impl Default for RepoPanel {
    fn default() -> Self {
        RepoPanel::new()
    }
}

impl RepoPanel {
    pub fn new() -> Self {
        RepoPanel {
            input: TextInput::new(48, URL_PLACEHOLDER),
            repos: Vec::new(),
            selected: 0,
            focus: RepoFocus::Input,
            cloning: false,
            loaded: false,
            status: None,
        }
    }

    pub fn init(&self) -> Vec<Command> {
        vec![Command::ListRepositories]
    }

    pub fn repos(&self) -> &[RepoRecord] {
        &self.repos
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_repo(&self) -> Option<&RepoRecord> {
        self.repos.get(self.selected)
    }

    pub fn focus(&self) -> RepoFocus {
        self.focus
    }

    pub fn is_cloning(&self) -> bool {
        self.cloning
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn status(&self) -> Option<&(String, bool)> {
        self.status.as_ref()
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status = Some((msg.into(), is_error));
    }

    pub fn update_key(&mut self, key: KeyEvent) -> Reply {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    RepoFocus::Input => RepoFocus::List,
                    RepoFocus::List => RepoFocus::Input,
                };
                return Reply::consumed();
            }
            KeyCode::Esc => {
                if self.input.value().is_empty() && self.status.is_none() {
                    return Reply::ignored();
                }
                self.input.clear();
                self.status = None;
                return Reply::consumed();
            }
            _ => {}
        }

        match self.focus {
            RepoFocus::Input => self.update_input(key),
            RepoFocus::List => self.update_list(key),
        }
    }

    fn update_input(&mut self, key: KeyEvent) -> Reply {
        if key.code == KeyCode::Enter {
            return match self.submit_url() {
                Some(command) => Reply::with_commands(vec![command]),
                None => Reply::consumed(),
            };
        }
        if self.input.update(key) {
            Reply::consumed()
        } else {
            Reply::ignored()
        }
    }

    fn update_list(&mut self, key: KeyEvent) -> Reply {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Reply::ignored();
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                Reply::consumed()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.repos.len() {
                    self.selected += 1;
                }
                Reply::consumed()
            }
            KeyCode::Enter => match self.selected_repo() {
                Some(record) => Reply::open(record.repo.clone()),
                None => Reply::consumed(),
            },
            KeyCode::Char('d') => match self.selected_repo() {
                Some(record) => {
                    let identifier = record.repo.clone();
                    info!(repo = %identifier, "deleting repository");
                    self.set_status(format!("Deleting {} ..", identifier), false);
                    Reply::with_commands(vec![Command::DeleteRepository { identifier }])
                }
                None => {
                    self.set_status("No repository selected.", true);
                    Reply::consumed()
                }
            },
            _ => Reply::ignored(),
        }
    }

    /// Validate the typed URL and start a clone. Rejections only set status.
    fn submit_url(&mut self) -> Option<Command> {
        if self.cloning {
            self.set_status("Repo cloning in progress", false);
            return None;
        }
        let url = self.input.value().trim().to_string();
        match self.validate_url(&url) {
            Ok(identifier) => {
                info!(repo = %identifier, url = %url, "cloning repository");
                self.cloning = true;
                self.set_status(format!("Cloning {} ..", identifier), false);
                Some(Command::CloneRepository { identifier, url })
            }
            Err(err) => {
                self.set_status(err.to_string(), true);
                None
            }
        }
    }

    fn validate_url(&self, url: &str) -> Result<String, ValidationError> {
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let lower = url.to_ascii_lowercase();
        if !URL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return Err(ValidationError::NotRepoUrl);
        }
        let identifier = git::parse_github_url(url).ok_or(ValidationError::UnsupportedHost)?;
        if self
            .repos
            .iter()
            .any(|r| r.repo.eq_ignore_ascii_case(&identifier))
        {
            return Err(ValidationError::DuplicateRepo);
        }
        Ok(identifier)
    }

    pub fn on_repos_loaded(&mut self, result: Result<Vec<RepoRecord>>) {
        match result {
            Ok(repos) => {
                debug!(count = repos.len(), "repositories loaded");
                self.repos = repos;
                self.clamp_selection();
                if !self.loaded {
                    self.loaded = true;
                    let count = self.repos.len();
                    self.set_status(format!("Loaded {} repositories", count), false);
                }
            }
            Err(err) => self.set_status(format!("Failed to load repositories: {}", err), true),
        }
    }

    pub fn on_repo_cloned(&mut self, record: &RepoRecord, result: &Result<()>) {
        self.cloning = false;
        match result {
            Ok(()) => {
                if let Some(idx) = self.repos.iter().position(|r| r.repo == record.repo) {
                    self.repos[idx] = record.clone();
                    self.selected = idx;
                } else {
                    self.repos.push(record.clone());
                    self.selected = self.repos.len() - 1;
                }
                self.input.clear();
                self.set_status("Repository added.", false);
            }
            Err(err) => self.set_status(format!("Failed to clone repo: {}", err), true),
        }
    }

    /// A successful delete triggers a full reload rather than a local removal.
    pub fn on_repo_deleted(&mut self, repo: &str, result: &Result<()>) -> Vec<Command> {
        match result {
            Ok(()) => {
                self.set_status(format!("Deleted: {}", repo), false);
                vec![Command::ListRepositories]
            }
            Err(err) => {
                self.set_status(format!("Failed to delete repo: {}", err), true);
                Vec::new()
            }
        }
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.repos.len() {
            self.selected = self.repos.len().saturating_sub(1);
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(area);

        let input_focused = self.focus == RepoFocus::Input;
        let input_style = if self.input.shows_placeholder() && !input_focused {
            theme.placeholder()
        } else {
            theme.text_style()
        };
        let input = Paragraph::new(Line::from(Span::styled(
            self.input.view(input_focused),
            input_style,
        )))
        .block(theme.panel_block("Add repository", input_focused));
        f.render_widget(input, chunks[0]);

        let list_focused = self.focus == RepoFocus::List;
        let items: Vec<ListItem> = if self.repos.is_empty() {
            vec![ListItem::new(Span::styled(
                "No repositories yet. Paste a URL above.",
                theme.muted(),
            ))]
        } else {
            self.repos
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    let style = if idx == self.selected {
                        theme.selected(list_focused)
                    } else if idx % 2 == 1 {
                        Style::default().bg(theme.zebra_bg).fg(theme.text)
                    } else {
                        theme.text_style()
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!(" {:<32}", record.repo), style),
                        Span::styled(format!(" {}", record.url), theme.muted()),
                    ]))
                })
                .collect()
        };
        let list = List::new(items).block(theme.panel_block("Repositories", list_focused));
        f.render_widget(list, chunks[1]);

        let mut footer = Vec::new();
        let mut hints = Vec::new();
        hints.extend(theme.hint("tab", "switch focus"));
        hints.extend(theme.hint("enter", "add/open"));
        hints.extend(theme.hint("d", "delete"));
        footer.push(Line::from(hints));
        if let Some((msg, is_error)) = &self.status {
            footer.push(Line::from(Span::styled(msg.clone(), theme.status(*is_error))));
        }
        f.render_widget(Paragraph::new(footer), chunks[2]);
    }
}
