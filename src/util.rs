use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "NCI_HOME";

/// Return the platform-appropriate data directory for nci.
/// - `$NCI_HOME` when set
/// - macOS: ~/.nci
/// - Linux: ~/.local/share/nci (or $XDG_DATA_HOME/nci)
/// - Windows: %APPDATA%\\nci
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(home) = env::var(HOME_ENV) {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    let base = match env::consts::OS {
        "macos" => dirs::home_dir().map(|h| h.join(".nci")),
        "windows" => dirs::data_dir().map(|d| d.join("nci")),
        _ => {
            if let Ok(xdg) = env::var("XDG_DATA_HOME") {
                Some(PathBuf::from(xdg).join("nci"))
            } else {
                dirs::home_dir().map(|h| h.join(".local").join("share").join("nci"))
            }
        }
    };

    base.ok_or_else(|| anyhow::anyhow!("could not resolve home directory"))
}

/// Convert an absolute path into a display-friendly path. On unix, replaces the home directory with "~".
pub fn display_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    if let Some(home) = dirs::home_dir() {
        if let Ok(rel) = path.strip_prefix(&home) {
            return format!("~/{}", rel.display());
        }
    }
    path.display().to_string()
}

/// Cut `s` down to at most `width` runes, marking the cut with an ellipsis.
pub fn truncate_runes(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let count = s.chars().count();
    if count <= width {
        return s.to_string();
    }
    if width == 1 {
        return "…".to_string();
    }
    let mut out: String = s.chars().take(width - 1).collect();
    out.push('…');
    out
}

/// Right-pad `s` with spaces up to `width` terminal columns.
pub fn pad_columns(s: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(s);
    if used >= width {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(width - used))
}

/// Step `idx` by one in the direction of `delta`, wrapping within `0..len`.
pub fn cycle_index(idx: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    let idx = idx.min(len - 1);
    match delta.signum() {
        1 => (idx + 1) % len,
        -1 => {
            if idx == 0 {
                len - 1
            } else {
                idx - 1
            }
        }
        _ => idx,
    }
}
