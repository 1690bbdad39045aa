//! Configuration file handling.
//!
//! Loads configuration from `~/.config/framegrab/config.toml` (platform
//! equivalent) or a custom path. Every field is optional; `main` merges
//! CLI arguments over config values over built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure.
///
/// ```toml
/// [labels]
/// names = ["one", "two", "three"]
///
/// [capture]
/// source = "0"        # webcam index, or a video file path
/// delay_ms = 1
///
/// [output]
/// dir = "Images"
///
/// [preview]
/// mirror = true
/// invert = false
/// ```
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct LabelsConfig {
    pub names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CaptureConfig {
    pub source: Option<String>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PreviewConfig {
    pub mirror: Option<bool>,
    pub invert: Option<bool>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    directories::ProjectDirs::from("com", "framegrab", "framegrab")
        .map(|d| d.config_dir().to_path_buf().join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/framegrab/config.toml")
        })
}
