use crate::tui::branch_panel::BranchPanel;
use crate::tui::message::{Command, Msg};
use crate::tui::repo_panel::RepoPanel;
use crate::tui::settings_panel::{SettingsPanel, SshViewer};
use crate::tui::theme::Theme;
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;
use tracing::info;

pub const TABS: [&str; 2] = ["Branches", "Settings"];

/// Root of the state tree. Owns every panel and routes input and results.
pub struct App {
    repo_panel: RepoPanel,
    branch_panel: BranchPanel,
    settings_panel: SettingsPanel,
    selected_repo: Option<String>,
    tab: usize,
    now: DateTime<Local>,
    size: (u16, u16),
    show_status_bar: bool,
    should_quit: bool,
}

impl App {
    pub fn new(show_status_bar: bool, ssh: SshViewer) -> Self {
        App {
            repo_panel: RepoPanel::new(),
            branch_panel: BranchPanel::new(),
            settings_panel: SettingsPanel::new(ssh),
            selected_repo: None,
            tab: 0,
            now: Local::now(),
            size: (0, 0),
            show_status_bar,
            should_quit: false,
        }
    }

    pub fn init(&self) -> Vec<Command> {
        self.repo_panel.init()
    }

    pub fn repo_panel(&self) -> &RepoPanel {
        &self.repo_panel
    }

    pub fn branch_panel(&self) -> &BranchPanel {
        &self.branch_panel
    }

    pub fn settings_panel(&self) -> &SettingsPanel {
        &self.settings_panel
    }

    pub fn selected_repo(&self) -> Option<&str> {
        self.selected_repo.as_deref()
    }

    pub fn tab(&self) -> usize {
        self.tab
    }

    pub fn now(&self) -> DateTime<Local> {
        self.now
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply one message and return the commands it produced.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.on_key(key),
            Msg::Resize(width, height) => {
                self.size = (width, height);
                Vec::new()
            }
            Msg::Tick(now) => {
                self.now = now;
                Vec::new()
            }

            Msg::ReposLoaded(result) => {
                self.branch_panel.on_repos_loaded(&result);
                self.repo_panel.on_repos_loaded(result);
                Vec::new()
            }
            Msg::RepoCloned { record, result } => {
                self.repo_panel.on_repo_cloned(&record, &result);
                self.branch_panel.on_repo_cloned(&record, &result);
                Vec::new()
            }
            Msg::RepoDeleted { repo, result } => {
                let mut commands = self.repo_panel.on_repo_deleted(&repo, &result);
                self.branch_panel.on_repo_deleted(&repo, &result);
                if result.is_ok() && self.selected_repo.as_deref() == Some(repo.as_str()) {
                    commands.extend(self.select_repo(None));
                }
                commands
            }

            Msg::MappingsLoaded { repo, result } => {
                self.branch_panel.on_mappings_loaded(&repo, result);
                Vec::new()
            }
            Msg::MappingSaved { mapping, result } => {
                self.branch_panel.on_mapping_saved(&mapping, &result);
                Vec::new()
            }
            Msg::MappingDeleted {
                repo,
                ref_pattern,
                result,
            } => {
                self.branch_panel
                    .on_mapping_deleted(&repo, &ref_pattern, &result);
                Vec::new()
            }
            Msg::JobsLoaded { filter, result } => {
                self.branch_panel.on_jobs_loaded(&filter, result);
                Vec::new()
            }

            Msg::SettingsLoaded { scope, result } => {
                self.settings_panel.on_settings_loaded(&scope, result);
                Vec::new()
            }
            Msg::SettingSaved {
                scope,
                key,
                value,
                result,
            } => {
                self.settings_panel
                    .on_setting_saved(&scope, &key, &value, &result);
                Vec::new()
            }
            Msg::SettingDeleted { scope, key, result } => {
                self.settings_panel.on_setting_deleted(&scope, &key, &result);
                Vec::new()
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let reply = match (&self.selected_repo, self.tab) {
            (None, _) => self.repo_panel.update_key(key),
            (Some(_), 0) => self.branch_panel.update_key(key),
            (Some(_), _) => self.settings_panel.update_key(key),
        };

        let mut commands = reply.commands;
        if let Some(repo) = reply.open_repo {
            commands.extend(self.select_repo(Some(repo)));
        }
        if reply.handled {
            return commands;
        }

        let repo_open = self.selected_repo.is_some();
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                info!("quit requested");
                self.should_quit = true;
            }
            KeyCode::Esc if repo_open => commands.extend(self.select_repo(None)),
            KeyCode::Left if repo_open => self.tab = self.tab.saturating_sub(1),
            KeyCode::Right if repo_open => self.tab = (self.tab + 1).min(TABS.len() - 1),
            _ => {}
        }
        commands
    }

    fn select_repo(&mut self, repo: Option<String>) -> Vec<Command> {
        info!(repo = repo.as_deref().unwrap_or("-"), "selecting repository");
        self.selected_repo = repo;
        self.tab = 0;
        let repo = self.selected_repo.as_deref();
        let mut commands = self.branch_panel.select_repo(repo);
        commands.extend(self.settings_panel.select_repo(repo));
        commands
    }

    pub fn draw(&self, f: &mut Frame, theme: &Theme) {
        let area = f.area();
        let mut constraints = vec![Constraint::Length(3), Constraint::Min(0)];
        if self.show_status_bar {
            constraints.push(Constraint::Length(2));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        self.draw_header(f, chunks[0], theme);

        let background = Block::default().style(Style::default().bg(theme.surface_bg));
        f.render_widget(background, chunks[1]);
        match self.selected_repo {
            None => self.repo_panel.render(f, chunks[1], theme),
            Some(_) if self.tab == 0 => {
                self.branch_panel.render(f, chunks[1], theme, Utc::now())
            }
            Some(_) => self.settings_panel.render(f, chunks[1], theme),
        }

        if self.show_status_bar {
            if let Some(status_area) = chunks.get(2) {
                self.draw_status(f, *status_area, theme);
            }
        }
    }

    fn draw_header(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_type(BorderType::Plain)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.header_bg));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[0]);

        let mut spans: Vec<Span> = Vec::new();
        match &self.selected_repo {
            None => spans.push(Span::styled(
                " Repositories ",
                Style::default()
                    .fg(Color::Rgb(20, 22, 28))
                    .bg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Some(repo) => {
                spans.push(Span::styled(format!("{}  ", repo), theme.title()));
                for (idx, label) in TABS.iter().enumerate() {
                    if idx > 0 {
                        spans.push(Span::raw("  "));
                    }
                    let style = if idx == self.tab {
                        Style::default()
                            .fg(Color::Rgb(20, 22, 28))
                            .bg(theme.accent)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                            .fg(theme.dim_text)
                            .add_modifier(Modifier::DIM)
                    };
                    spans.push(Span::styled(format!(" {} ", label), style));
                }
            }
        }
        f.render_widget(Paragraph::new(Line::from(spans)), cols[0]);

        let logo = Paragraph::new(Line::from(vec![
            Span::styled("nci", theme.title()),
            Span::styled(" console  ", theme.muted()),
            Span::styled(self.now.format("%H:%M:%S").to_string(), theme.text_style()),
        ]))
        .alignment(Alignment::Right);
        f.render_widget(logo, cols[1]);

        let mut hints = Vec::new();
        if self.selected_repo.is_some() {
            hints.extend(theme.hint("←/→", "tabs"));
            hints.extend(theme.hint("esc", "repositories"));
        }
        hints.extend(theme.hint("ctrl+c", "quit"));
        let nav = Paragraph::new(Line::from(hints)).alignment(Alignment::Center);
        f.render_widget(nav, rows[1]);
    }

    fn draw_status(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let repos = self.repo_panel.repos().len();
        let mut spans = vec![
            Span::styled(format!("{} repositories", repos), theme.muted()),
            Span::styled("  |  ", Style::default().fg(theme.border)),
        ];
        if self.repo_panel.is_cloning() {
            spans.push(Span::styled("cloning  ", Style::default().fg(theme.warning)));
        }
        spans.extend(theme.hint("esc", "top"));
        spans.extend(theme.hint("ctrl+c", "quit"));
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.header_bg));
        f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BranchMapping, RepoRecord, SettingScope};
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press(app: &mut App, code: KeyCode) -> Vec<Command> {
        app.update(Msg::Key(key(code)))
    }

    fn record(repo: &str) -> RepoRecord {
        RepoRecord {
            repo: repo.to_string(),
            url: format!("https://github.com/{}.git", repo),
        }
    }

    fn app_with(repos: &[&str]) -> App {
        let mut app = App::new(true, SshViewer::new(None));
        app.update(Msg::ReposLoaded(Ok(repos.iter().map(|r| record(r)).collect())));
        app
    }

    fn open(app: &mut App, down: usize) -> Vec<Command> {
        press(app, KeyCode::Tab);
        for _ in 0..down {
            press(app, KeyCode::Down);
        }
        press(app, KeyCode::Enter)
    }

    #[test]
    fn init_lists_repositories() {
        let app = App::new(false, SshViewer::new(None));
        assert_eq!(app.init(), vec![Command::ListRepositories]);
    }

    #[test]
    fn opening_a_repo_fans_out_loads() {
        let mut app = app_with(&["acme/api", "acme/web"]);
        let commands = open(&mut app, 1);
        assert_eq!(app.selected_repo(), Some("acme/web"));
        assert_eq!(commands.len(), 4);
        assert!(commands.contains(&Command::ListBranchMappings {
            repo: "acme/web".to_string()
        }));
        assert!(commands.contains(&Command::ListSettings(SettingScope::Global)));
    }

    #[test]
    fn ctrl_c_quits_when_unconsumed() {
        let mut app = app_with(&[]);
        app.update(Msg::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());
    }

    #[test]
    fn esc_returns_to_repository_list() {
        let mut app = app_with(&["acme/api"]);
        open(&mut app, 0);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.selected_repo(), None);
        assert_eq!(app.branch_panel().repo(), None);
        assert_eq!(app.settings_panel().repo(), None);
    }

    #[test]
    fn esc_consumed_by_form_does_not_deselect() {
        let mut app = app_with(&["acme/api"]);
        open(&mut app, 0);
        app.update(Msg::MappingsLoaded {
            repo: "acme/api".to_string(),
            result: Ok(vec![BranchMapping {
                repo: "acme/api".to_string(),
                ref_pattern: "main".to_string(),
                script_path: "ci.sh".to_string(),
            }]),
        });
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.selected_repo(), Some("acme/api"));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.selected_repo(), None);
    }

    #[test]
    fn arrows_switch_tabs_only_with_repo_selected() {
        let mut app = app_with(&["acme/api"]);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab(), 0);

        open(&mut app, 0);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab(), 1);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab(), 1);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.tab(), 0);
    }

    #[test]
    fn arrows_inside_an_edit_stay_in_the_form() {
        let mut app = app_with(&["acme/api"]);
        open(&mut app, 0);
        app.update(Msg::MappingsLoaded {
            repo: "acme/api".to_string(),
            result: Ok(vec![BranchMapping {
                repo: "acme/api".to_string(),
                ref_pattern: "main".to_string(),
                script_path: "ci.sh".to_string(),
            }]),
        });
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab(), 0);
    }

    #[test]
    fn deleting_selected_repo_deselects_it() {
        let mut app = app_with(&["acme/api"]);
        open(&mut app, 0);
        let commands = app.update(Msg::RepoDeleted {
            repo: "acme/api".to_string(),
            result: Ok(()),
        });
        assert_eq!(commands, vec![Command::ListRepositories]);
        assert_eq!(app.selected_repo(), None);
    }

    #[test]
    fn tick_and_resize_only_touch_display_state() {
        let mut app = app_with(&[]);
        let now = Local::now();
        assert!(app.update(Msg::Tick(now)).is_empty());
        assert_eq!(app.now(), now);
        assert!(app.update(Msg::Resize(120, 40)).is_empty());
        assert_eq!(app.size(), (120, 40));
    }
}
