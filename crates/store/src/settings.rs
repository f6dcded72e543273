//! Engine settings management
//!
//! Settings are stored as JSON (`settings.json`) and control the defaults the
//! editing engine applies: who tracked changes are attributed to, whether a
//! replacement that empties a paragraph removes it, and how saved packages
//! are compressed.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main engine settings container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Tracked-change settings
    pub revisions: RevisionSettings,
    /// Text editing defaults
    pub editing: EditingSettings,
    /// Package output settings
    pub package: PackageSettings,
}

/// Tracked-change settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevisionSettings {
    /// Author recorded on `w:ins`/`w:del` revisions
    pub author: String,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            author: "Author".to_string(),
        }
    }
}

/// Text editing defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditingSettings {
    /// Remove paragraphs left empty by a replacement
    pub remove_empty_paragraphs: bool,
    /// Treat search values as literal text unless regex is requested
    pub escape_regex: bool,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            remove_empty_paragraphs: true,
            escape_regex: true,
        }
    }
}

/// Package output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackageSettings {
    /// Compression applied to XML parts (media is always stored)
    pub compression: Compression,
    /// Deflate level, `None` for the zip default
    pub compression_level: Option<i64>,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            compression: Compression::Deflated,
            compression_level: None,
        }
    }
}

/// ZIP compression method for saved parts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

/// Settings manager for loading, saving, and updating engine settings
pub struct SettingsManager {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Current settings (cached)
    current: EngineSettings,
}

impl SettingsManager {
    /// Create a new settings manager for the given configuration directory
    pub fn new(config_dir: PathBuf) -> Self {
        let settings_path = config_dir.join("settings.json");
        Self {
            settings_path,
            current: EngineSettings::default(),
        }
    }

    /// Get the path to the settings file
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load(&mut self) -> Result<&EngineSettings> {
        if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            match serde_json::from_str::<EngineSettings>(&content) {
                Ok(settings) => {
                    self.current = settings;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse settings file, using defaults: {}",
                        e
                    );
                    self.current = EngineSettings::default();
                }
            }
        } else {
            self.current = EngineSettings::default();
        }
        Ok(&self.current)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &EngineSettings {
        &self.current
    }

    /// Update settings and save to disk
    pub fn update(&mut self, settings: EngineSettings) -> Result<()> {
        self.current = settings;
        self.save()
    }

    /// Reset settings to defaults and save
    pub fn reset(&mut self) -> Result<&EngineSettings> {
        self.current = EngineSettings::default();
        self.save()?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();

        assert_eq!(settings.revisions.author, "Author");
        assert!(settings.editing.remove_empty_paragraphs);
        assert!(settings.editing.escape_regex);
        assert_eq!(settings.package.compression, Compression::Deflated);
        assert_eq!(settings.package.compression_level, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: EngineSettings =
            serde_json::from_str(r#"{"revisions": {"author": "Reviewer"}}"#).unwrap();
        assert_eq!(parsed.revisions.author, "Reviewer");
        assert!(parsed.editing.remove_empty_paragraphs);
    }

    #[test]
    fn test_compression_serialization() {
        assert_eq!(serde_json::to_string(&Compression::Stored).unwrap(), "\"stored\"");
        assert_eq!(serde_json::to_string(&Compression::Deflated).unwrap(), "\"deflated\"");
    }

    #[test]
    fn test_settings_manager_load_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        // Load should return defaults when no file exists
        let settings = manager.load().unwrap();
        assert_eq!(settings, &EngineSettings::default());

        let mut new_settings = EngineSettings::default();
        new_settings.revisions.author = "Editor".to_string();
        new_settings.package.compression = Compression::Stored;
        manager.update(new_settings).unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().to_path_buf());
        let loaded = manager2.load().unwrap();
        assert_eq!(loaded.revisions.author, "Editor");
        assert_eq!(loaded.package.compression, Compression::Stored);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{ not json").unwrap();

        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());
        let settings = manager.load().unwrap();
        assert_eq!(settings, &EngineSettings::default());
    }

    #[test]
    fn test_settings_manager_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let mut new_settings = EngineSettings::default();
        new_settings.editing.remove_empty_paragraphs = false;
        manager.update(new_settings).unwrap();

        let settings = manager.reset().unwrap();
        assert!(settings.editing.remove_empty_paragraphs);
    }
}
