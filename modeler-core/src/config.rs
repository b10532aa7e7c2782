//! # Configuration management for Modeler Core
//!
//! Settings live in a TOML file under the user's configuration directory.
//! Missing sections and fields fall back to their defaults, so a config file
//! only needs to name what it changes.

use crate::{Error, Result};
use modeler_editor_api::{
    AppMetadata, EditorLayout, EditorOptions, Language, Locale, LogLayout, PanelLayout,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration structure for the modeler.
///
/// # Example
///
/// ```rust
/// use modeler_core::Config;
///
/// let config = Config::default();
/// assert_eq!(config.app.language, "en");
/// assert_eq!(config.editor.properties_panel_width, 250);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application-wide settings
    pub app: AppConfig,
    /// File dialog settings
    pub dialogs: DialogConfig,
    /// Editor settings
    pub editor: EditorConfig,
    /// Export settings
    pub export: ExportConfig,
    /// Advanced settings
    pub advanced: AdvancedConfig,
}

/// Application-wide configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interface language (`en` or `ru`)
    pub language: String,
    /// Development mode, shows the Reload menu item
    pub development: bool,
    /// Application name written into saved diagrams
    pub name: String,
    /// Application version written into saved diagrams
    pub version: String,
}

/// File dialog configuration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Initial directory for open and save dialogs
    pub default_path: Option<PathBuf>,
}

/// Diagram editor configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether the properties panel starts open
    pub properties_panel_open: bool,
    /// Initial properties panel width in pixels
    pub properties_panel_width: u32,
    /// Whether import warnings are written to the log
    pub show_import_warnings: bool,
}

/// Export configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Value of `process.name` in exported archives
    pub war_process_name: String,
}

/// Advanced configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            development: false,
            name: "Modeler".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            properties_panel_open: false,
            properties_panel_width: 250,
            show_import_warnings: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            war_process_name: "my first".to_string(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or fall back to defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Config;
    ///
    /// let config = Config::load_or_default().unwrap();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn load_or_default() -> Result<Self> {
        let loaded = Self::default_config_path().and_then(|path| {
            if path.exists() {
                Self::load_from_file(&path).map(Some)
            } else {
                Ok(None)
            }
        });

        match loaded {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Ok(Self::default()),
            Err(e) => {
                tracing::warn!("Ignoring unusable configuration: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::config(format!("Failed to create config directory: {}", e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| Error::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    ///
    /// # Example
    ///
    /// ```rust
    /// use modeler_core::Config;
    ///
    /// let mut config = Config::default();
    /// config.app.language = "de".to_string();
    ///
    /// let error = config.validate().unwrap_err();
    /// assert!(error.to_string().contains("app.language"));
    /// ```
    pub fn validate(&self) -> Result<()> {
        self.language()?;

        if self.app.name.trim().is_empty() {
            return Err(Error::validation("app.name", "Application name must not be empty"));
        }

        if self.editor.properties_panel_width == 0 {
            return Err(Error::validation(
                "editor.properties_panel_width",
                "Panel width must be greater than 0",
            ));
        }

        if self.export.war_process_name.trim().is_empty() {
            return Err(Error::validation(
                "export.war_process_name",
                "Process name must not be empty",
            ));
        }

        let levels = ["error", "warn", "info", "debug", "trace"];
        if !levels.contains(&self.advanced.log_level.as_str()) {
            return Err(Error::validation(
                "advanced.log_level",
                "Log level must be one of: error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }

    /// Configured interface language.
    pub fn language(&self) -> Result<Language> {
        self.app
            .language
            .parse()
            .map_err(|e: String| Error::validation("app.language", e))
    }

    /// String tables for the configured language, English if it is invalid.
    pub fn locale(&self) -> Arc<Locale> {
        Arc::new(Locale::new(self.language().unwrap_or_default()))
    }

    /// Name and version stamped into saved diagrams.
    pub fn metadata(&self) -> AppMetadata {
        AppMetadata::new(self.app.name.clone(), self.app.version.clone())
    }

    /// Options for newly created editors.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions::default()
            .with_locale(self.locale())
            .with_metadata(self.metadata())
            .with_layout(EditorLayout {
                properties_panel: PanelLayout {
                    open: self.editor.properties_panel_open,
                    width: self.editor.properties_panel_width,
                },
                log: LogLayout::default(),
            })
    }

    /// Get the default configuration file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not determine config directory"))?
            .join("modeler");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.language, "en");
        assert!(!config.app.development);
        assert_eq!(config.export.war_process_name, "my first");
        assert!(config.dialogs.default_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[app]\nlanguage = \"ru\"\n").unwrap();
        assert_eq!(config.language().unwrap(), Language::Ru);
        assert_eq!(config.app.name, "Modeler");
        assert_eq!(config.editor.properties_panel_width, 250);
    }

    #[test]
    fn test_config_validation_errors() {
        let mut config = Config::default();
        config.editor.properties_panel_width = 0;
        assert!(config.validate().unwrap_err().is_validation());

        config = Config::default();
        config.advanced.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.export.war_process_name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.app.development = true;
        config.dialogs.default_path = Some(temp_dir.path().to_path_buf());

        assert!(config.save_to_file(&config_path).is_ok());
        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[app]\nlanguage = \"xx\"\n").unwrap();

        assert!(Config::load_from_file(&config_path).is_err());
        assert!(Config::load_from_file(temp_dir.path().join("missing.toml"))
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn test_editor_options_follow_config() {
        let mut config = Config::default();
        config.app.language = "ru".to_string();
        config.app.version = "9.9.9".to_string();
        config.editor.properties_panel_open = true;

        let options = config.editor_options();
        assert_eq!(options.locale.language(), Language::Ru);
        assert_eq!(options.metadata.version, "9.9.9");
        assert!(options.layout.properties_panel.open);
    }
}
