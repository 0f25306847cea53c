use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SalesError};
use crate::models::MonthFile;

const DEFAULT_MONTHS: &[&str] = &["JUN", "JUL", "AUG", "SEP"];

/// One monthly export as written in settings.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub month: String,
    /// Absolute, `~`-prefixed, or relative to `data_dir`.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceEntry>,
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_sources() -> Vec<SourceEntry> {
    DEFAULT_MONTHS
        .iter()
        .map(|m| SourceEntry {
            month: m.to_string(),
            file: format!("{m} Category Sales Summary.Xlsx"),
            sheet: None,
        })
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            top_n: default_top_n(),
            sources: default_sources(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(expand_home(&self.data_dir))
    }

    /// Resolve every configured source to a concrete file, in configured order.
    pub fn month_files(&self) -> Vec<MonthFile> {
        let data_dir = self.data_path();
        self.sources
            .iter()
            .map(|s| {
                let file = PathBuf::from(expand_home(&s.file));
                let path = if file.is_absolute() {
                    file
                } else {
                    data_dir.join(file)
                };
                MonthFile {
                    month: s.month.clone(),
                    path,
                    sheet: s.sheet.clone(),
                }
            })
            .collect()
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("catsales")
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Read settings from `path`, falling back to defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| SalesError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SalesError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn expand_home(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
