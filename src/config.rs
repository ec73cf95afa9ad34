//! Startup configuration.
//!
//! Every field has a default matching the stock asset pack, so the program runs
//! without any configuration file. When present, the file is looked up as
//! `./controllertest.toml` first and then as `controllertest/config.toml` in the
//! platform configuration directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

/// File name searched in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "controllertest.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown log level '{0}'")]
    LogLevel(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub layout: LayoutConfig,
    pub text: TextConfig,
    pub log_level: LogLevel,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
    /// Upper bound between two frames while no window input arrives.
    /// Gamepad events do not wake the window on their own.
    pub repaint_interval_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "13 Button Controller Test".to_string(),
            width: 1000.0,
            height: 750.0,
            repaint_interval_ms: 16,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub font: PathBuf,
    pub font_size: f32,
    pub mapping_db: PathBuf,
    /// One image per button state, `Idle` first.
    pub images: Vec<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        let mut images = vec![PathBuf::from("Test raw.png")];
        images.extend((1..=13).map(|n| PathBuf::from(format!("Test {n}.png"))));

        Self {
            font: PathBuf::from("ASENINE.ttf"),
            font_size: 28.0,
            mapping_db: PathBuf::from("gamecontrollerdb.txt"),
            images,
        }
    }
}

/// Placement of the axis label/value pairs, in window points.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance of the label columns from the left and right window edges.
    pub inset: f32,
    /// Gap between a label and the value below it.
    pub margin: f32,
    pub top_row: f32,
    pub bottom_row: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            inset: 50.0,
            margin: 10.0,
            top_row: 100.0,
            bottom_row: 250.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    /// RGB color of all overlay text
    pub color: (u8, u8, u8),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct LogLevel(pub String);

impl Default for LogLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl LogLevel {
    pub fn to_level(&self) -> Result<Level, ConfigError> {
        self.0
            .parse::<Level>()
            .map_err(|_| ConfigError::LogLevel(self.0.clone()))
    }
}

impl Config {
    /// Loads the first configuration file found, or the defaults.
    ///
    /// Runs before logging is set up, so the file used is returned for the caller to report.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_first(&Self::candidate_paths())
    }

    fn load_first(candidates: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Ok((Self::from_file(path)?, Some(path.clone()))),
            None => Ok((Self::default(), None)),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("controllertest").join("config.toml"));
        }
        paths
    }
}
