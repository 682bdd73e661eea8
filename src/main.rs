use anyhow::{anyhow, Context, Result};
use clap::Parser;
use nci::config::appsettings::{self, ConsoleSettings};
use nci::store::{CiStore, YamlStore};
use nci::{tui, util};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nci",
    about = "Terminal console for the nci CI controller"
)]
struct Cli {
    /// Data directory (defaults to $NCI_HOME or the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `nci=trace` (overrides console.yaml)
    #[arg(long)]
    log_level: Option<String>,

    /// Hide the bottom status bar
    #[arg(long)]
    no_status_bar: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => util::data_dir()?,
    };
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", util::display_path(&data_dir)))?;

    let (mut settings, _) = appsettings::load_console_settings(&data_dir)?;
    let wrote_defaults = appsettings::write_defaults_if_missing(&data_dir, &settings);
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if cli.no_status_bar {
        settings.ui.show_status_bar = false;
    }

    init_logging(&data_dir, &settings)?;
    info!(data_dir = %util::display_path(&data_dir), "starting console");
    match wrote_defaults {
        Ok(true) => info!("wrote default console settings"),
        Ok(false) => {}
        Err(err) => warn!(error = %err, "could not write default console settings"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    let store: Arc<dyn CiStore> = Arc::new(YamlStore::open(&data_dir)?);

    let result = tui::run(store, runtime.handle().clone(), &settings);
    runtime.shutdown_background();
    result
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(data_dir: &Path, settings: &ConsoleSettings) -> Result<()> {
    let log_path = settings.logging.path(data_dir);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init()
        .map_err(|err| anyhow!("initializing logging: {}", err))
}
