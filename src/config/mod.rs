// Configuration management for Choosr
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::{Context, Result};
use dirs::{config_dir, data_dir};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub preferences: Preferences,
    pub shuffle: ShuffleConfig,
    pub logging: LoggingConfig,
}

/// User-facing settings; these travel with backups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub avoid_previous_results: bool,
    pub view_type: ViewType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuffleConfig {
    /// Pause before revealing a pick, purely for show
    pub choosing_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Grid,
    List,
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewType::Grid => write!(f, "grid"),
            ViewType::List => write!(f, "list"),
        }
    }
}

impl FromStr for ViewType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "grid" => Ok(ViewType::Grid),
            "list" => Ok(ViewType::List),
            other => Err(anyhow::anyhow!("unknown view type '{}' (expected grid or list)", other)),
        }
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join("choosr")
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = app_dir(data_dir());

        Self {
            data_path: data_dir.join("lists.json"),
            preferences: Preferences::default(),
            shuffle: ShuffleConfig::default(),
            logging: LoggingConfig {
                directory: data_dir.join("logs"),
                filter: "info,choosr=debug".to_string(),
            },
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            avoid_previous_results: false,
            view_type: ViewType::Grid,
        }
    }
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            choosing_delay_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Config::default().logging
    }
}

impl Config {
    /// Load from the standard location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("choosr");

        Ok(config_dir.join("config.toml"))
    }
}
