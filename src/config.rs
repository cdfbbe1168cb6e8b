//! Configuration file support
//!
//! Settings are read from TOML and merged with command-line overrides; values
//! given on the command line win.
//!
//! # Lookup order
//!
//! 1. `--config <path>`
//! 2. `./frame-outline.toml`
//! 3. `<config_dir>/frame-outline/config.toml`
//!
//! # Example
//!
//! ```toml
//! strategy = "gradient"
//! threshold = 0.96
//! max_val = 255.0
//! channel_tolerance = 0
//! threads = 4
//! write_rejected = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::density::DensityOptions;
use crate::outline::OutlineStrategy;

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "frame-outline.toml";

/// Directory under the user config dir
const USER_CONFIG_DIR: &str = "frame-outline";

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings as read from a config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub strategy: Option<OutlineStrategy>,
    pub threshold: Option<f64>,
    pub max_val: Option<f64>,
    pub channel_tolerance: Option<u8>,
    pub threads: Option<usize>,
    pub write_rejected: Option<bool>,
}

impl Config {
    /// Load from the first existing default location, or defaults if none exists
    pub fn load() -> Result<Self> {
        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Default locations in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(user_path) = Self::user_config_path() {
            paths.push(user_path);
        }
        paths
    }

    /// `<config_dir>/frame-outline/config.toml`, if the platform has a config dir
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join("config.toml"))
    }

    /// Resolve the effective settings; CLI values take precedence
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> FilterConfig {
        let defaults = FilterConfig::default();

        let density = DensityOptions::builder()
            .threshold(
                cli.threshold
                    .or(self.threshold)
                    .unwrap_or(defaults.density.threshold),
            )
            .max_val(cli.max_val.or(self.max_val).unwrap_or(defaults.density.max_val))
            .channel_tolerance(
                cli.channel_tolerance
                    .or(self.channel_tolerance)
                    .unwrap_or(defaults.density.channel_tolerance),
            )
            .build();

        FilterConfig {
            strategy: cli.strategy.or(self.strategy).unwrap_or(defaults.strategy),
            density,
            threads: cli.threads.or(self.threads),
            write_rejected: cli
                .write_rejected
                .or(self.write_rejected)
                .unwrap_or(defaults.write_rejected),
        }
    }
}

/// Values explicitly set on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub strategy: Option<OutlineStrategy>,
    pub threshold: Option<f64>,
    pub max_val: Option<f64>,
    pub channel_tolerance: Option<u8>,
    pub threads: Option<usize>,
    pub write_rejected: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Effective settings for a filter run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterConfig {
    /// Outline extraction strategy
    pub strategy: OutlineStrategy,

    /// Density decision parameters
    pub density: DensityOptions,

    /// Worker threads (None = one per CPU)
    pub threads: Option<usize>,

    /// Also write outlines of rejected frames
    pub write_rejected: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strategy: OutlineStrategy::default(),
            density: DensityOptions::default(),
            threads: None,
            write_rejected: false,
        }
    }
}

impl FilterConfig {
    /// Number of worker threads actually used
    pub fn effective_threads(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
