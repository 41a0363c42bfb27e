// Application settings
// Loaded from ~/.config/checkcell/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "CHECKCELL_CONFIG";

/// Display status applied when a question is first shown.
///
/// Isolating a single input needs a cell, so it cannot be a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialStatus {
    #[default]
    AllErrors,
    NoErrors,
}

impl InitialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitialStatus::AllErrors => "all-errors",
            InitialStatus::NoErrors => "no-errors",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Display
    #[serde(rename = "display.initialStatus")]
    pub initial_status: InitialStatus,

    #[serde(rename = "display.showFormulas")]
    pub show_formulas: bool,

    /// Rendered cell width in characters.
    #[serde(rename = "display.columnWidth")]
    pub column_width: usize,

    #[serde(rename = "display.showContextInputs")]
    pub show_context_inputs: bool,

    // Engine
    #[serde(rename = "engine.maxChainedTransitions")]
    pub max_chained_transitions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            initial_status: InitialStatus::AllErrors,
            show_formulas: false,
            column_width: 12,
            show_context_inputs: true,
            max_chained_transitions: 16,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("checkcell")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("error parsing {}: {e}; using default settings", path.display());
                Self::default()
            }),
            Err(e) => {
                log::warn!("error reading {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.initial_status, InitialStatus::AllErrors);
        assert_eq!(s.column_width, 12);
        assert_eq!(s.max_chained_transitions, 16);
        assert!(s.show_context_inputs);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let s = Settings::parse(
            r#"{
                // start with the clean spreadsheet
                "display.initialStatus": "no-errors",
                "display.columnWidth": 20
            }"#,
        )
        .unwrap();
        assert_eq!(s.initial_status, InitialStatus::NoErrors);
        assert_eq!(s.column_width, 20);
        assert!(!s.show_formulas);
        assert_eq!(s.max_chained_transitions, 16);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(Settings::parse(r#"{ "display.initialStatus": "all-but-one-error" }"#).is_err());
    }

    #[test]
    fn test_missing_and_malformed_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            show_formulas: true,
            max_chained_transitions: 4,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"engine.maxChainedTransitions\": 4"));
        assert_eq!(Settings::load_from(&path), settings);
    }
}
