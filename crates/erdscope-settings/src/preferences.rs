//! Diagram preferences

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::settings_file::preferences_file;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Render every column of a table instead of only key columns
    pub show_all_columns: bool,
    pub debug_ui: bool,
}

impl Preferences {
    /// Debug overlays are only available in debug builds
    pub fn is_debugging_ui(&self) -> bool {
        cfg!(debug_assertions) && self.debug_ui
    }
}

/// JSON file holding [`Preferences`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesFile {
    path: PathBuf,
}

impl PreferencesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `preferences.json` in the erdscope config directory
    pub fn default_location() -> Result<Self> {
        preferences_file().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the preferences. A missing file yields the defaults.
    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {:?}", self.path))?;
        serde_json::from_str(&content).with_context(|| "Failed to parse preferences JSON")
    }

    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write preferences to {:?}", self.path))?;
        tracing::debug!(path = ?self.path, "saved preferences");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = PreferencesFile::new(dir.path().join("preferences.json"));
        assert_eq!(file.load().unwrap(), Preferences::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = PreferencesFile::new(dir.path().join("nested").join("preferences.json"));
        let preferences = Preferences {
            show_all_columns: true,
            debug_ui: false,
        };
        file.save(&preferences).unwrap();
        assert_eq!(file.load().unwrap(), preferences);
    }

    #[test]
    fn test_unknown_fields_and_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{"debug_ui": true, "theme": "dark"}"#).unwrap();

        let loaded = PreferencesFile::new(&path).load().unwrap();
        assert!(loaded.debug_ui);
        assert!(!loaded.show_all_columns);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PreferencesFile::new(&path).load().is_err());
    }

    #[test]
    fn test_debugging_ui_requires_flag() {
        let preferences = Preferences::default();
        assert!(!preferences.is_debugging_ui());

        let preferences = Preferences {
            debug_ui: true,
            ..Default::default()
        };
        assert_eq!(preferences.is_debugging_ui(), cfg!(debug_assertions));
    }
}
