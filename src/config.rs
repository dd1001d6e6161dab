//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The user file is
//! merged over stock defaults, so it only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! # dir = "out"                  # Omit to write next to each source file
//! convert_suffix = "_converted"  # Suffix for convert/compress outputs
//! edit_suffix = "_edited"        # Suffix for pipeline outputs
//!
//! [encoding]
//! quality = 85                   # JPEG / compress quality (1-100)
//!
//! [viewport]
//! min_zoom = 0.1
//! max_zoom = 10.0
//! handle_radius = 6.0            # Handle grab distance in screen pixels
//!
//! [processing]
//! max_processes = 4              # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::naming::OutputNaming;
use crate::session::InteractionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where outputs go and how they are named.
    pub output: OutputConfig,
    /// Default encoding settings.
    pub encoding: EncodingConfig,
    /// Editor interaction limits.
    pub viewport: ViewportConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.quality) {
            return Err(ConfigError::Validation(
                "encoding.quality must be 1-100".into(),
            ));
        }
        if self.output.convert_suffix.is_empty() || self.output.edit_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "output suffixes must not be empty".into(),
            ));
        }
        let v = &self.viewport;
        if !(v.min_zoom.is_finite() && v.min_zoom > 0.0) {
            return Err(ConfigError::Validation(
                "viewport.min_zoom must be positive".into(),
            ));
        }
        if !(v.max_zoom.is_finite() && v.max_zoom >= v.min_zoom) {
            return Err(ConfigError::Validation(
                "viewport.max_zoom must be >= viewport.min_zoom".into(),
            ));
        }
        if !(v.handle_radius.is_finite() && v.handle_radius >= 0.0) {
            return Err(ConfigError::Validation(
                "viewport.handle_radius must be non-negative".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Naming for convert/compress jobs.
    pub fn convert_naming(&self) -> OutputNaming {
        self.output.naming(&self.output.convert_suffix)
    }

    /// Naming for pipeline jobs.
    pub fn edit_naming(&self) -> OutputNaming {
        self.output.naming(&self.output.edit_suffix)
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.encoding.quality)
    }

    pub fn interaction(&self) -> InteractionSettings {
        InteractionSettings {
            min_zoom: self.viewport.min_zoom,
            max_zoom: self.viewport.max_zoom,
            handle_radius: self.viewport.handle_radius,
        }
    }
}

/// Output location and naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output directory. When absent, outputs are written beside their source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub convert_suffix: String,
    pub edit_suffix: String,
}

impl OutputConfig {
    fn naming(&self, suffix: &str) -> OutputNaming {
        OutputNaming {
            dir: self.dir.clone(),
            suffix: suffix.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            convert_suffix: "_converted".to_string(),
            edit_suffix: "_edited".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Lossy quality (1-100).
    pub quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub handle_radius: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let defaults = InteractionSettings::default();
        Self {
            min_zoom: defaults.min_zoom,
            max_zoom: defaults.max_zoom,
            handle_radius: defaults.handle_radius,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Stock defaults as a TOML value, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or the stock defaults when `None`.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    let config = resolve_config(overlay)?;
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cropline configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output location and naming
# ---------------------------------------------------------------------------
[output]
# Directory for all outputs. Leave unset to write each output next to its
# source file.
# dir = "out"

# Appended to the file stem for convert and compress jobs:
#   photo.png -> photo_converted.webp
convert_suffix = "_converted"

# Appended to the file stem for edit pipelines.
edit_suffix = "_edited"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (1 = smallest, 100 = best). Lossless formats ignore it.
quality = 85

# ---------------------------------------------------------------------------
# Editor viewport
# ---------------------------------------------------------------------------
[viewport]
# Zoom limits, as screen pixels per image pixel.
min_zoom = 0.1
max_zoom = 10.0

# How close (in screen pixels) the pointer must be to grab a crop handle.
handle_radius = 6.0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
