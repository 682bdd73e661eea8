use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default = "default_show_status_bar")]
    pub show_status_bar: bool,
    /// Interval of the clock tick that refreshes relative times.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_show_status_bar() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for UiSettings {
    fn default() -> Self {
        UiSettings {
            show_status_bar: default_show_status_bar(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file, relative to the data directory unless absolute.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "nci-console.log".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl LogSettings {
    pub fn path(&self, data_dir: &Path) -> PathBuf {
        let file = Path::new(&self.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsoleSettings {
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

pub const CONSOLE_SETTINGS_FILE: &str = "console.yaml";

pub fn load_console_settings(dir: &Path) -> Result<(ConsoleSettings, PathBuf)> {
    let path = dir.join(CONSOLE_SETTINGS_FILE);
    if !path.exists() {
        return Ok((ConsoleSettings::default(), path));
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed reading console settings {}", path.display()))?;
    let mut settings: ConsoleSettings = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed parsing console settings {}", path.display()))?;
    // Ensure defaults for empty fields
    let defaults = ConsoleSettings::default();
    if settings.logging.level.trim().is_empty() {
        settings.logging.level = defaults.logging.level;
    }
    if settings.logging.file.trim().is_empty() {
        settings.logging.file = defaults.logging.file;
    }
    if settings.ui.tick_interval_ms == 0 {
        settings.ui.tick_interval_ms = defaults.ui.tick_interval_ms;
    }
    Ok((settings, path))
}

pub fn save_console_settings(dir: &Path, settings: &ConsoleSettings) -> Result<()> {
    let path = dir.join(CONSOLE_SETTINGS_FILE);
    let yaml = serde_yaml::to_string(settings)?;
    let header = "# nci console settings\n# This file is auto-generated. Edit carefully.\n\n";
    fs::create_dir_all(dir)?;
    fs::write(&path, format!("{}{}", header, yaml))
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

/// Write `settings` only when no settings file exists yet. Returns whether it wrote.
pub fn write_defaults_if_missing(dir: &Path, settings: &ConsoleSettings) -> Result<bool> {
    if dir.join(CONSOLE_SETTINGS_FILE).exists() {
        return Ok(false);
    }
    save_console_settings(dir, settings)?;
    Ok(true)
}
