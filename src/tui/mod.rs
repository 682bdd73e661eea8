//! Terminal console: panels, message routing and the event loop.

pub mod app;
pub mod branch_panel;
pub mod error;
pub mod executor;
pub mod form;
pub mod input;
pub mod message;
pub mod repo_panel;
pub mod settings_panel;
pub mod theme;

use crate::config::appsettings::ConsoleSettings;
use crate::store::CiStore;
use anyhow::Result;
use app::App;
use chrono::Local;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use executor::CommandRunner;
use message::Msg;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use settings_panel::SshViewer;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};
use theme::Theme;
use tokio::runtime::Handle;
use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Take over the terminal and run the console until the user quits.
pub fn run(store: Arc<dyn CiStore>, handle: Handle, settings: &ConsoleSettings) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, store, handle, settings);

    disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    store: Arc<dyn CiStore>,
    handle: Handle,
    settings: &ConsoleSettings,
) -> Result<()> {
    let theme = Theme::default();
    let (runner, mut results) = CommandRunner::new(store, handle);
    let mut app = App::new(settings.ui.show_status_bar, SshViewer::from_env());

    let size = terminal.size()?;
    runner.dispatch(app.update(Msg::Resize(size.width, size.height)));
    runner.dispatch(app.init());

    let tick_rate = Duration::from_millis(settings.ui.tick_interval_ms.max(1));
    let mut last_tick = Instant::now();
    info!("console started");

    loop {
        terminal.draw(|f| app.draw(f, &theme))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    runner.dispatch(app.update(Msg::Key(key)));
                }
                Event::Resize(width, height) => {
                    runner.dispatch(app.update(Msg::Resize(width, height)));
                }
                _ => {}
            }
        }

        while let Ok(msg) = results.try_recv() {
            runner.dispatch(app.update(msg));
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            runner.dispatch(app.update(Msg::Tick(Local::now())));
        }

        if app.should_quit() {
            break;
        }
    }

    info!("console stopped");
    Ok(())
}
