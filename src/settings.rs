use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::convert::DEFAULT_UNIT;
use crate::error::{BudgetError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default dataset: a CSV path or an http(s) URL.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Slices shown per chart before the rest fold into "Others".
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Characters kept of long names in tables and charts.
    #[serde(default = "default_name_width")]
    pub name_width: usize,
    /// Where date-stamped exports go when no `--output` is given.
    #[serde(default)]
    pub export_dir: Option<String>,
}

fn default_source() -> String {
    "data/2026.csv".to_string()
}

fn default_unit_label() -> String {
    DEFAULT_UNIT.to_string()
}

fn default_currency_symbol() -> String {
    "\u{20b1}".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_name_width() -> usize {
    48
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: default_source(),
            unit_label: default_unit_label(),
            currency_symbol: default_currency_symbol(),
            top_n: default_top_n(),
            name_width: default_name_width(),
            export_dir: None,
        }
    }
}

impl Settings {
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_deref()
            .map(|d| PathBuf::from(shellexpand_path(d)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("budgetview")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Parse settings JSON; anything unreadable falls back to defaults.
pub fn parse_settings(content: &str) -> Settings {
    match serde_json::from_str(content) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Ignoring malformed settings: {e}");
            Settings::default()
        }
    }
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        parse_settings(&content)
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BudgetError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            source: "https://example.org/2026.csv".to_string(),
            top_n: 5,
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded = parse_settings(&content);
        assert_eq!(loaded.source, "https://example.org/2026.csv");
        assert_eq!(loaded.top_n, 5);
        assert_eq!(loaded.unit_label, DEFAULT_UNIT);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.top_n, 10);
        assert_eq!(s.currency_symbol, "\u{20b1}");
        assert!(s.export_dir.is_none());
        assert_eq!(s.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let s = parse_settings(r#"{"source": "other.csv", "name_width": 20}"#);
        assert_eq!(s.source, "other.csv");
        assert_eq!(s.name_width, 20);
        assert_eq!(s.top_n, 10);
    }

    #[test]
    fn test_malformed_settings_fall_back() {
        let s = parse_settings("{ not json");
        assert_eq!(s.source, default_source());
    }

    #[test]
    fn test_shellexpand_leaves_plain_paths() {
        assert_eq!(shellexpand_path("data/x.csv"), "data/x.csv");
    }
}
