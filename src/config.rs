//! TOML configuration file support.
//!
//! Search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./pagefit.toml` - current directory
//! 3. `~/.config/pagefit-pdf/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! threads = 4
//!
//! [detection]
//! mode = "text"
//! dpi = 150
//! margin = 0.02
//!
//! [output]
//! device = "paperwhite"
//! uniform = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detect::DetectionMode;
use crate::device::DeviceProfile;
use crate::pipeline::PipelineConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Number of worker threads
    #[serde(default)]
    pub threads: Option<usize>,

    /// Verbosity level (0-2)
    #[serde(default)]
    pub verbose: Option<u8>,
}

/// Content detection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// Detection mode: "text", "components" or "threshold"
    #[serde(default)]
    pub mode: Option<String>,

    /// Binarization threshold (0 = automatic)
    #[serde(default)]
    pub threshold: Option<u8>,

    /// Margin fraction around detected bounds
    #[serde(default)]
    pub margin: Option<f64>,

    /// Rasterization DPI
    #[serde(default)]
    pub dpi: Option<u32>,

    /// Minimum character size in pixels at 150 DPI
    #[serde(default)]
    pub min_char_size: Option<u32>,

    /// Maximum character size in pixels at 150 DPI
    #[serde(default)]
    pub max_char_size: Option<u32>,

    /// Minimum pixel count per content component
    #[serde(default)]
    pub min_content_pixels: Option<u32>,
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Target device profile name
    #[serde(default)]
    pub device: Option<String>,

    /// Apply one crop box to every page
    #[serde(default)]
    pub uniform: Option<bool>,

    /// Skip files whose output already exists
    #[serde(default)]
    pub skip_existing: Option<bool>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path.
    pub fn load() -> Result<Self, ConfigError> {
        let current_dir_config = PathBuf::from("pagefit.toml");
        if current_dir_config.exists() {
            return Self::load_from_path(&current_dir_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pagefit-pdf").join("config.toml");
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Config file search paths.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pagefit.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pagefit-pdf").join("config.toml"));
        }
        paths
    }

    /// Convert to a pipeline configuration.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(threads) = self.general.threads {
            config.threads = Some(threads);
        }

        if let Some(mode) = self.detection.mode.as_deref().and_then(parse_mode) {
            config.mode = mode;
        }
        if let Some(threshold) = self.detection.threshold {
            config.threshold = threshold;
        }
        if let Some(margin) = self.detection.margin {
            config.margin_fraction = margin;
        }
        if let Some(dpi) = self.detection.dpi {
            config.dpi = dpi;
        }
        if let Some(size) = self.detection.min_char_size {
            config.min_char_size = size;
        }
        if let Some(size) = self.detection.max_char_size {
            config.max_char_size = size;
        }
        if let Some(pixels) = self.detection.min_content_pixels {
            config.min_content_pixels = pixels;
        }

        if let Some(device) = self.output.device.as_deref() {
            config.device = Some(DeviceProfile::lookup(device));
        }
        if let Some(uniform) = self.output.uniform {
            config.uniform = uniform;
        }
        if let Some(skip) = self.output.skip_existing {
            config.skip_existing = skip;
        }

        config
    }

    /// Merge with CLI arguments (CLI takes precedence).
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        let mut config = self.to_pipeline_config();

        if let Some(mode) = cli.mode {
            config.mode = mode;
        }
        if let Some(threshold) = cli.threshold {
            config.threshold = threshold;
        }
        if let Some(margin) = cli.margin {
            config.margin_fraction = margin;
        }
        if let Some(dpi) = cli.dpi {
            config.dpi = dpi;
        }
        if let Some(device) = cli.device.as_deref() {
            config.device = Some(DeviceProfile::lookup(device));
        }
        if cli.no_device {
            config.device = None;
        }
        if let Some(uniform) = cli.uniform {
            config.uniform = uniform;
        }
        if let Some(threads) = cli.threads {
            config.threads = Some(threads);
        }
        if let Some(skip) = cli.skip_existing {
            config.skip_existing = skip;
        }

        config
    }
}

/// Parse a detection mode name from config or CLI.
pub fn parse_mode(name: &str) -> Option<DetectionMode> {
    match name.to_ascii_lowercase().as_str() {
        "text" => Some(DetectionMode::Text),
        "components" | "image" => Some(DetectionMode::Components),
        "threshold" => Some(DetectionMode::Threshold),
        _ => None,
    }
}

/// CLI override values for merging with config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub mode: Option<DetectionMode>,
    pub threshold: Option<u8>,
    pub margin: Option<f64>,
    pub dpi: Option<u32>,
    pub device: Option<String>,
    pub no_device: bool,
    pub uniform: Option<bool>,
    pub threads: Option<usize>,
    pub skip_existing: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = Some(margin);
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }
}
