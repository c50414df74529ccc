use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::theme::Theme;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub limits: LimitsConfig,
    pub layout: LayoutConfig,
    pub theme_name: String,
    #[serde(skip)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub wrap: bool,
    pub show_line_numbers: bool,
    pub auto_indent: bool,
    /// How long transient status messages stay up.
    pub message_timeout_ms: u64,
    pub undo_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wrap: true,
            show_line_numbers: true,
            auto_indent: true,
            message_timeout_ms: 2000,
            undo_limit: 10_000,
        }
    }
}

/// Ceilings applied when loading a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_file_size: u64,
    pub max_lines: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            max_lines: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Share of the width given to the left pane of a two-way split.
    pub split_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { split_ratio: 0.5 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            limits: LimitsConfig::default(),
            layout: LayoutConfig::default(),
            theme_name: String::from("dark"),
            theme: Theme::dark(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            // A read-only config dir is no reason to refuse to start
            if let Err(e) = config.save_to(&config_path) {
                warn!(path = %config_path.display(), error = %e, "could not write default config");
            }
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        let known = Theme::available_themes();
        if !known.contains(&config.theme_name.to_lowercase().as_str()) {
            warn!(theme = %config.theme_name, ?known, "unknown theme, using dark");
        }
        config.theme = Theme::from_name(&config.theme_name);
        config.layout.split_ratio = config.layout.split_ratio.clamp(0.1, 0.9);
        info!(path = %path.display(), theme = %config.theme_name, "config loaded");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    fn config_file_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "vx", "vx").context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.editor.wrap);
        assert_eq!(config.editor.undo_limit, 10_000);
        assert_eq!(config.limits.max_file_size, 104_857_600);
        assert_eq!(config.limits.max_lines, 1_000_000);
        assert_eq!(config.layout.split_ratio, 0.5);
        assert_eq!(config.theme.name, "dark");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "theme_name = \"light\"\n[editor]\nwrap = false\n[layout]\nsplit_ratio = 2.0\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.editor.wrap);
        assert!(config.editor.auto_indent);
        assert_eq!(config.limits.max_lines, 1_000_000);
        assert_eq!(config.theme.name, "light");
        assert_eq!(config.layout.split_ratio, 0.9);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[editor\nwrap = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.limits.max_lines = 42;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.limits.max_lines, 42);
    }
}
