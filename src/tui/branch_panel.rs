//! Per-repository branch mappings and recent jobs.

use crate::store::{BranchMapping, JobFilter, JobStatus, JobSummary, RepoRecord};
use crate::tui::form::{Form, FormEffect, KeyValueEntry, ValueType};
use crate::tui::message::{Command, Reply};
use crate::tui::theme::Theme;
use crate::util::cycle_index;
use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};
use ratatui::Frame;
use std::collections::HashMap;
use tracing::debug;

const SCRIPT_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchTab {
    Mappings,
    Jobs,
}

pub struct BranchPanel {
    repo: Option<String>,
    remotes: HashMap<String, String>,
    /// Mappings the store has confirmed; the form may run ahead of these.
    mappings: Vec<BranchMapping>,
    form: Form,
    jobs: Vec<JobSummary>,
    selected_job: usize,
    tab: BranchTab,
    status: Option<(String, bool)>,
}

impl Default for BranchPanel {
    fn default() -> Self {
        BranchPanel::new()
    }
}

impl BranchPanel {
    pub fn new() -> Self {
        BranchPanel {
            repo: None,
            remotes: HashMap::new(),
            mappings: Vec::new(),
            form: Form::new(Vec::new(), SCRIPT_WIDTH, true),
            jobs: Vec::new(),
            selected_job: 0,
            tab: BranchTab::Mappings,
            status: None,
        }
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    pub fn mappings(&self) -> &[BranchMapping] {
        &self.mappings
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn jobs(&self) -> &[JobSummary] {
        &self.jobs
    }

    pub fn selected_job(&self) -> usize {
        self.selected_job
    }

    pub fn tab(&self) -> BranchTab {
        self.tab
    }

    pub fn status(&self) -> Option<&(String, bool)> {
        self.status.as_ref()
    }

    pub fn remote_url(&self) -> Option<&str> {
        let repo = self.repo.as_ref()?;
        self.remotes.get(repo).map(String::as_str)
    }

    fn set_status(&mut self, msg: impl Into<String>, is_error: bool) {
        self.status = Some((msg.into(), is_error));
    }

    /// Switch to `repo` (or to nothing) and request its data.
    pub fn select_repo(&mut self, repo: Option<&str>) -> Vec<Command> {
        self.repo = repo.map(str::to_string);
        self.mappings.clear();
        self.form = Form::new(Vec::new(), SCRIPT_WIDTH, true);
        self.jobs.clear();
        self.selected_job = 0;
        self.tab = BranchTab::Mappings;
        self.status = None;

        match repo {
            Some(repo) => vec![
                Command::ListBranchMappings {
                    repo: repo.to_string(),
                },
                Command::ListJobs(JobFilter {
                    repo: repo.to_string(),
                    ref_pattern: None,
                }),
            ],
            None => Vec::new(),
        }
    }

    fn is_current(&self, repo: &str) -> bool {
        self.repo.as_deref() == Some(repo)
    }

    pub fn update_key(&mut self, key: KeyEvent) -> Reply {
        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            // an edit in progress pins the tab
            if !self.form.is_editing() {
                self.tab = match self.tab {
                    BranchTab::Mappings => BranchTab::Jobs,
                    BranchTab::Jobs => BranchTab::Mappings,
                };
            }
            return Reply::consumed();
        }

        match self.tab {
            BranchTab::Mappings => self.update_mappings(key),
            BranchTab::Jobs => self.update_jobs(key),
        }
    }

    fn update_mappings(&mut self, key: KeyEvent) -> Reply {
        let (handled, effect) = self.form.update(key);
        let commands = match (effect, self.repo.clone()) {
            (Some(effect), Some(repo)) => vec![mapping_command(&repo, effect)],
            _ => Vec::new(),
        };
        Reply {
            handled,
            commands,
            open_repo: None,
        }
    }

    fn update_jobs(&mut self, key: KeyEvent) -> Reply {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Reply::ignored();
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_job = cycle_index(self.selected_job, self.jobs.len(), -1);
                Reply::consumed()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_job = cycle_index(self.selected_job, self.jobs.len(), 1);
                Reply::consumed()
            }
            KeyCode::Char('r') => match &self.repo {
                Some(repo) => Reply::with_commands(vec![Command::ListJobs(JobFilter {
                    repo: repo.clone(),
                    ref_pattern: None,
                })]),
                None => Reply::consumed(),
            },
            _ => Reply::ignored(),
        }
    }

    pub fn on_repos_loaded(&mut self, result: &Result<Vec<RepoRecord>>) {
        if let Ok(repos) = result {
            self.remotes = repos
                .iter()
                .map(|r| (r.repo.clone(), r.url.clone()))
                .collect();
        }
    }

    pub fn on_repo_cloned(&mut self, record: &RepoRecord, result: &Result<()>) {
        if result.is_ok() {
            self.remotes.insert(record.repo.clone(), record.url.clone());
        }
    }

    pub fn on_repo_deleted(&mut self, repo: &str, result: &Result<()>) {
        if result.is_ok() {
            self.remotes.remove(repo);
        }
    }

    pub fn on_mappings_loaded(&mut self, repo: &str, result: Result<Vec<BranchMapping>>) {
        if !self.is_current(repo) {
            debug!(repo, "discarding stale branch mappings");
            return;
        }
        match result {
            Ok(mappings) => {
                self.mappings = mappings;
                self.rebuild_form();
            }
            Err(err) => self.set_status(format!("Failed to load branch mappings: {}", err), true),
        }
    }

    pub fn on_mapping_saved(&mut self, mapping: &BranchMapping, result: &Result<()>) {
        if !self.is_current(&mapping.repo) {
            debug!(repo = %mapping.repo, "discarding stale mapping save");
            return;
        }
        match result {
            Ok(()) => {
                match self
                    .mappings
                    .iter_mut()
                    .find(|m| m.ref_pattern == mapping.ref_pattern)
                {
                    Some(existing) => existing.script_path = mapping.script_path.clone(),
                    None => self.mappings.push(mapping.clone()),
                }
                // a rebuild after another failure may have dropped this row
                self.form.ensure_entry(KeyValueEntry::new(
                    &mapping.ref_pattern,
                    &mapping.script_path,
                    ValueType::String,
                ));
                self.set_status(format!("Saved mapping for {}", mapping.ref_pattern), false);
            }
            Err(err) => {
                self.set_status(format!("Failed to save mapping: {}", err), true);
                self.rebuild_form();
            }
        }
    }

    pub fn on_mapping_deleted(&mut self, repo: &str, ref_pattern: &str, result: &Result<()>) {
        if !self.is_current(repo) {
            debug!(repo, "discarding stale mapping delete");
            return;
        }
        match result {
            Ok(()) => {
                self.mappings.retain(|m| m.ref_pattern != ref_pattern);
                self.form.remove_entry(ref_pattern);
                self.set_status(format!("Deleted mapping for {}", ref_pattern), false);
            }
            Err(err) => {
                self.set_status(format!("Failed to delete mapping: {}", err), true);
                self.rebuild_form();
            }
        }
    }

    pub fn on_jobs_loaded(&mut self, filter: &JobFilter, result: Result<Vec<JobSummary>>) {
        if !self.is_current(&filter.repo) {
            debug!(repo = %filter.repo, "discarding stale jobs");
            return;
        }
        match result {
            Ok(jobs) => {
                self.jobs = jobs;
                if self.selected_job >= self.jobs.len() {
                    self.selected_job = self.jobs.len().saturating_sub(1);
                }
            }
            Err(err) => self.set_status(format!("Failed to load jobs: {}", err), true),
        }
    }

    fn rebuild_form(&mut self) {
        let entries = self
            .mappings
            .iter()
            .map(|m| KeyValueEntry::new(&m.ref_pattern, &m.script_path, ValueType::String))
            .collect();
        self.form.set_entries(entries);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, theme: &Theme, now: DateTime<Utc>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        let remote = self.remote_url().unwrap_or("-").to_string();
        let mut tabs = Vec::new();
        for (label, tab) in [("Mappings", BranchTab::Mappings), ("Jobs", BranchTab::Jobs)] {
            let style = if tab == self.tab {
                theme.selected(true)
            } else {
                theme.muted()
            };
            tabs.push(Span::styled(format!(" {} ", label), style));
            tabs.push(Span::raw(" "));
        }
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("remote ", theme.muted()),
                Span::styled(remote, theme.text_style()),
            ]),
            Line::from(tabs),
        ]);
        f.render_widget(header, chunks[0]);

        match self.tab {
            BranchTab::Mappings => {
                let block = theme.panel_block("Branch mappings", true);
                let inner = block.inner(chunks[1]);
                f.render_widget(block, chunks[1]);
                self.form.render(f, inner, theme, true);
            }
            BranchTab::Jobs => {
                let items: Vec<ListItem> = if self.jobs.is_empty() {
                    vec![ListItem::new(Span::styled("No jobs yet.", theme.muted()))]
                } else {
                    self.jobs
                        .iter()
                        .enumerate()
                        .map(|(idx, job)| {
                            let style = if idx == self.selected_job {
                                theme.selected(true)
                            } else {
                                theme.text_style()
                            };
                            ListItem::new(Line::from(vec![
                                Span::styled(job_line(job, now), style),
                                Span::styled(format!("  {}", job.ref_name), theme.muted()),
                            ]))
                        })
                        .collect()
                };
                let list = List::new(items).block(theme.panel_block("Recent jobs", true));
                f.render_widget(list, chunks[1]);
            }
        }

        let footer = match &self.status {
            Some((msg, is_error)) => {
                Line::from(Span::styled(msg.clone(), theme.status(*is_error)))
            }
            None => {
                let mut hints = theme.hint("tab", "mappings/jobs");
                if self.tab == BranchTab::Jobs {
                    hints.extend(theme.hint("r", "reload"));
                }
                Line::from(hints)
            }
        };
        f.render_widget(Paragraph::new(footer), chunks[2]);
    }
}

fn mapping_command(repo: &str, effect: FormEffect) -> Command {
    match effect {
        FormEffect::Added(entry) | FormEffect::Changed(entry) => {
            Command::SaveBranchMapping(BranchMapping {
                repo: repo.to_string(),
                ref_pattern: entry.key,
                script_path: entry.value,
            })
        }
        FormEffect::Deleted(entry) => Command::DeleteBranchMapping {
            repo: repo.to_string(),
            ref_pattern: entry.key,
        },
    }
}

/// Fixed four-column status code.
pub fn status_code(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Finished => "PASS",
        JobStatus::Failed => "FAIL",
        JobStatus::Running => "RUN",
        JobStatus::Pending => "PEND",
        JobStatus::Canceled => "CANC",
        JobStatus::Unknown => "UNKN",
    }
}

pub fn short_sha(sha: &str) -> String {
    let sha = sha.trim();
    if sha.is_empty() {
        return "-".to_string();
    }
    sha.chars().take(8).collect()
}

/// Run time rounded to the millisecond, or `--` unless `end` is after `start`.
pub fn format_duration(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            let delta = end - start;
            let ms = match delta.num_microseconds() {
                Some(us) => (us + 500) / 1000,
                None => delta.num_milliseconds(),
            };
            human_duration(ms)
        }
        _ => "--".to_string(),
    }
}

/// Render milliseconds as `850ms`, `1.5s`, `2m3.25s` or `1h0m0s`.
fn human_duration(ms: i64) -> String {
    if ms <= 0 {
        return "0s".to_string();
    }
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let sec_ms = ms % 60_000;
    let whole = sec_ms / 1000;
    let frac = sec_ms % 1000;
    let seconds = if frac == 0 {
        format!("{}s", whole)
    } else {
        let frac = format!("{:03}", frac);
        format!("{}.{}s", whole, frac.trim_end_matches('0'))
    };

    if hours > 0 {
        format!("{}h{}m{}", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}", minutes, seconds)
    } else {
        seconds
    }
}

/// Age of the job's last timestamp relative to `now`.
pub fn time_ago(job: &JobSummary, now: DateTime<Utc>) -> String {
    let Some(ts) = job.end.or(job.start) else {
        return "--".to_string();
    };
    let secs = (now - ts).num_seconds().abs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86_400)
    }
}

pub fn job_line(job: &JobSummary, now: DateTime<Utc>) -> String {
    format!(
        "{:<4}  {:<8}  {:<7}  {}",
        status_code(job.status),
        short_sha(&job.commit_sha),
        format_duration(job.start, job.end),
        time_ago(job, now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mapping(repo: &str, pattern: &str, script: &str) -> BranchMapping {
        BranchMapping {
            repo: repo.to_string(),
            ref_pattern: pattern.to_string(),
            script_path: script.to_string(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn job(status: JobStatus, sha: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> JobSummary {
        JobSummary {
            repo: "acme/api".to_string(),
            ref_name: "main".to_string(),
            status,
            commit_sha: sha.to_string(),
            start,
            end,
        }
    }

    fn loaded_panel() -> BranchPanel {
        let mut panel = BranchPanel::new();
        panel.select_repo(Some("acme/api"));
        panel.on_mappings_loaded(
            "acme/api",
            Ok(vec![
                mapping("acme/api", "main", "ci/main.sh"),
                mapping("acme/api", "release/*", "ci/release.sh"),
            ]),
        );
        panel
    }

    mod formatting {
        use super::*;

        #[test]
        fn status_codes_are_fixed() {
            assert_eq!(status_code(JobStatus::Finished), "PASS");
            assert_eq!(status_code(JobStatus::Failed), "FAIL");
            assert_eq!(status_code(JobStatus::Running), "RUN");
            assert_eq!(status_code(JobStatus::Pending), "PEND");
            assert_eq!(status_code(JobStatus::Canceled), "CANC");
            assert_eq!(status_code(JobStatus::parse("")), "UNKN");
        }

        #[test]
        fn sha_is_cut_to_eight() {
            assert_eq!(short_sha("a1b2c3d4e5"), "a1b2c3d4");
            assert_eq!(short_sha("abc"), "abc");
            assert_eq!(short_sha(""), "-");
        }

        #[test]
        fn durations_round_to_milliseconds() {
            let start = t0();
            let d = |ms: i64| format_duration(Some(start), Some(start + Duration::milliseconds(ms)));
            assert_eq!(d(850), "850ms");
            assert_eq!(d(1500), "1.5s");
            assert_eq!(d(123_250), "2m3.25s");
            assert_eq!(d(3_600_000), "1h0m0s");
            assert_eq!(
                format_duration(Some(start), Some(start + Duration::microseconds(1_499_600))),
                "1.5s"
            );
        }

        #[test]
        fn duration_needs_end_after_start() {
            let start = t0();
            assert_eq!(format_duration(Some(start), None), "--");
            assert_eq!(format_duration(None, Some(start)), "--");
            assert_eq!(format_duration(Some(start), Some(start)), "--");
            assert_eq!(
                format_duration(Some(start), Some(start - Duration::seconds(5))),
                "--"
            );
        }

        #[test]
        fn relative_time_prefers_end_then_start() {
            let now = t0();
            let finished = job(
                JobStatus::Finished,
                "",
                Some(now - Duration::hours(3)),
                Some(now - Duration::seconds(30)),
            );
            assert_eq!(time_ago(&finished, now), "30s ago");
            let running = job(JobStatus::Running, "", Some(now - Duration::minutes(5)), None);
            assert_eq!(time_ago(&running, now), "5m ago");
            let queued = job(JobStatus::Pending, "", None, None);
            assert_eq!(time_ago(&queued, now), "--");
        }

        #[test]
        fn relative_time_thresholds() {
            let now = t0();
            let at = |d: Duration| time_ago(&job(JobStatus::Finished, "", None, Some(now - d)), now);
            assert_eq!(at(Duration::seconds(59)), "59s ago");
            assert_eq!(at(Duration::seconds(60)), "1m ago");
            assert_eq!(at(Duration::minutes(59)), "59m ago");
            assert_eq!(at(Duration::hours(2)), "2h ago");
            assert_eq!(at(Duration::hours(24)), "1d ago");
            assert_eq!(at(Duration::days(9)), "9d ago");
        }

        #[test]
        fn job_line_lays_out_columns() {
            let start = t0();
            let end = start + Duration::milliseconds(850);
            let now = end + Duration::seconds(10);
            let row = job(JobStatus::Finished, "a1b2c3d4e5", Some(start), Some(end));
            assert_eq!(job_line(&row, now), "PASS  a1b2c3d4  850ms    10s ago");
        }
    }

    #[test]
    fn select_repo_requests_mappings_and_jobs() {
        let mut panel = BranchPanel::new();
        let commands = panel.select_repo(Some("acme/api"));
        assert_eq!(
            commands,
            vec![
                Command::ListBranchMappings {
                    repo: "acme/api".to_string()
                },
                Command::ListJobs(JobFilter {
                    repo: "acme/api".to_string(),
                    ref_pattern: None
                }),
            ]
        );
        assert!(panel.select_repo(None).is_empty());
        assert_eq!(panel.repo(), None);
    }

    #[test]
    fn loaded_mappings_replace_form_entries() {
        let mut panel = loaded_panel();
        assert_eq!(panel.form().entries().len(), 2);
        assert_eq!(panel.form().entries()[1].key, "release/*");

        panel.on_mappings_loaded("acme/api", Ok(vec![mapping("acme/api", "dev", "ci/dev.sh")]));
        let keys: Vec<&str> = panel.form().entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["dev"]);
    }

    #[test]
    fn stale_mappings_for_other_repo_are_discarded() {
        let mut panel = loaded_panel();
        panel.on_mappings_loaded("acme/web", Ok(vec![mapping("acme/web", "x", "y")]));
        assert_eq!(panel.mappings().len(), 2);
        assert_eq!(panel.form().entries().len(), 2);
    }

    #[test]
    fn form_effects_become_store_commands() {
        let mut panel = loaded_panel();
        panel.update_key(key(KeyCode::Char('a')));
        for c in "dev".chars() {
            panel.update_key(key(KeyCode::Char(c)));
        }
        panel.update_key(key(KeyCode::Enter));
        for c in "ci/dev.sh".chars() {
            panel.update_key(key(KeyCode::Char(c)));
        }
        let reply = panel.update_key(key(KeyCode::Enter));
        assert_eq!(
            reply.commands,
            vec![Command::SaveBranchMapping(mapping("acme/api", "dev", "ci/dev.sh"))]
        );

        let reply = panel.update_key(key(KeyCode::Char('d')));
        assert_eq!(
            reply.commands,
            vec![Command::DeleteBranchMapping {
                repo: "acme/api".to_string(),
                ref_pattern: "dev".to_string()
            }]
        );
    }

    #[test]
    fn confirmed_results_update_mapping_list() {
        let mut panel = loaded_panel();
        panel.on_mapping_saved(&mapping("acme/api", "dev", "ci/dev.sh"), &Ok(()));
        assert_eq!(panel.mappings().len(), 3);
        panel.on_mapping_saved(&mapping("acme/api", "main", "ci/other.sh"), &Ok(()));
        assert_eq!(panel.mappings().len(), 3);
        assert_eq!(panel.mappings()[0].script_path, "ci/other.sh");
        panel.on_mapping_deleted("acme/api", "main", &Ok(()));
        assert!(panel.mappings().iter().all(|m| m.ref_pattern != "main"));
    }

    #[test]
    fn failed_delete_restores_form_from_confirmed_list() {
        let mut panel = loaded_panel();
        let reply = panel.update_key(key(KeyCode::Char('d')));
        assert_eq!(reply.commands.len(), 1);
        assert_eq!(panel.form().entries().len(), 1);

        panel.on_mapping_deleted("acme/api", "main", &Err(anyhow::anyhow!("locked")));
        assert_eq!(panel.form().entries().len(), 2);
        assert_eq!(panel.mappings().len(), 2);
        assert_eq!(
            panel.status(),
            Some(&("Failed to delete mapping: locked".to_string(), true))
        );
    }

    #[test]
    fn save_confirmed_after_failed_delete_returns_to_form() {
        let mut panel = loaded_panel();
        panel.update_key(key(KeyCode::Char('a')));
        for c in "dev".chars() {
            panel.update_key(key(KeyCode::Char(c)));
        }
        panel.update_key(key(KeyCode::Enter));
        for c in "ci/dev.sh".chars() {
            panel.update_key(key(KeyCode::Char(c)));
        }
        panel.update_key(key(KeyCode::Enter));

        // select release/* and delete it while the dev save is in flight
        panel.update_key(key(KeyCode::Up));
        let reply = panel.update_key(key(KeyCode::Char('d')));
        assert_eq!(
            reply.commands,
            vec![Command::DeleteBranchMapping {
                repo: "acme/api".to_string(),
                ref_pattern: "release/*".to_string()
            }]
        );

        panel.on_mapping_deleted("acme/api", "release/*", &Err(anyhow::anyhow!("locked")));
        panel.on_mapping_saved(&mapping("acme/api", "dev", "ci/dev.sh"), &Ok(()));

        let confirmed: Vec<&str> = panel.mappings().iter().map(|m| m.ref_pattern.as_str()).collect();
        let shown: Vec<&str> = panel.form().entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(confirmed, vec!["main", "release/*", "dev"]);
        assert_eq!(shown, confirmed);
    }

    #[test]
    fn delete_confirmed_after_failed_save_leaves_form() {
        let mut panel = loaded_panel();
        // delete main, then edit release/* while the delete is in flight
        panel.update_key(key(KeyCode::Char('d')));
        panel.update_key(key(KeyCode::Char('e')));
        panel.update_key(key(KeyCode::Char('2')));
        let reply = panel.update_key(key(KeyCode::Enter));
        assert_eq!(
            reply.commands,
            vec![Command::SaveBranchMapping(mapping("acme/api", "release/*", "ci/release.sh2"))]
        );

        panel.on_mapping_saved(
            &mapping("acme/api", "release/*", "ci/release.sh2"),
            &Err(anyhow::anyhow!("disk full")),
        );
        assert_eq!(panel.form().entries().len(), 2);
        panel.on_mapping_deleted("acme/api", "main", &Ok(()));

        let shown: Vec<&str> = panel.form().entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(shown, vec!["release/*"]);
        assert_eq!(panel.form().entries()[0].value, "ci/release.sh");
        assert_eq!(panel.mappings().len(), 1);
    }

    #[test]
    fn tab_is_swallowed_while_form_is_editing() {
        let mut panel = loaded_panel();
        panel.update_key(key(KeyCode::Char('e')));
        assert!(panel.update_key(key(KeyCode::Tab)).handled);
        assert_eq!(panel.tab(), BranchTab::Mappings);
        panel.update_key(key(KeyCode::Esc));
        panel.update_key(key(KeyCode::Tab));
        assert_eq!(panel.tab(), BranchTab::Jobs);
    }

    #[test]
    fn jobs_tab_navigates_and_reloads() {
        let mut panel = loaded_panel();
        let filter = JobFilter {
            repo: "acme/api".to_string(),
            ref_pattern: None,
        };
        panel.on_jobs_loaded(
            &filter,
            Ok(vec![
                job(JobStatus::Running, "a", None, None),
                job(JobStatus::Failed, "b", None, None),
            ]),
        );
        panel.update_key(key(KeyCode::Tab));
        panel.update_key(key(KeyCode::Char('k')));
        assert_eq!(panel.selected_job(), 1);
        panel.update_key(key(KeyCode::Down));
        assert_eq!(panel.selected_job(), 0);

        let reply = panel.update_key(key(KeyCode::Char('r')));
        assert_eq!(reply.commands, vec![Command::ListJobs(filter)]);

        // left/right belong to the parent
        assert!(!panel.update_key(key(KeyCode::Left)).handled);
    }

    #[test]
    fn stale_jobs_are_discarded() {
        let mut panel = loaded_panel();
        panel.on_jobs_loaded(
            &JobFilter {
                repo: "acme/web".to_string(),
                ref_pattern: None,
            },
            Ok(vec![job(JobStatus::Running, "a", None, None)]),
        );
        assert!(panel.jobs().is_empty());
    }

    #[test]
    fn remote_url_follows_repository_messages() {
        let mut panel = BranchPanel::new();
        panel.on_repos_loaded(&Ok(vec![RepoRecord {
            repo: "acme/api".to_string(),
            url: "git@github.com:acme/api.git".to_string(),
        }]));
        panel.select_repo(Some("acme/api"));
        assert_eq!(panel.remote_url(), Some("git@github.com:acme/api.git"));
        panel.on_repo_deleted("acme/api", &Ok(()));
        assert_eq!(panel.remote_url(), None);
    }
}
