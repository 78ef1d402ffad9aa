//! Tool configuration module.
//!
//! Handles loading, validating, and merging `retouch.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [enhance]
//! mode = "quality-aware"       # or "standard" (skip analysis and corrections)
//! max_dimension = 4096         # Longest output edge; larger results are shrunk
//! max_input_pixels = 16000000  # Larger inputs are rejected
//! max_working_pixels = 64000000  # Larger upscaled rasters are rejected
//! timeout_secs = 60            # Per-image time budget (0 = unlimited)
//!
//! [blur]
//! max_pixels = 4000000         # Larger inputs are shrunk before blurring
//! mask = "radial"              # or "edges"
//!
//! [output]
//! jpeg_quality = 95            # JPEG quality (1-100)
//!
//! [processing]
//! max_processes = 4            # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::engine::{
    DEFAULT_BLUR_MAX_PIXELS, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_INPUT_PIXELS,
    DEFAULT_MAX_WORKING_PIXELS, DEFAULT_TIMEOUT, EnhanceMode, EnhanceOptions,
};
use crate::io::DEFAULT_JPEG_QUALITY;
use crate::mask::MaskStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File name looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "retouch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `retouch.toml`.
///
/// All fields have defaults. User files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetouchConfig {
    /// Enhancement pipeline limits.
    pub enhance: EnhanceConfig,
    /// Background blur settings.
    pub blur: BlurConfig,
    /// Encoder settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl RetouchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enhance.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "enhance.max_dimension must be non-zero".into(),
            ));
        }
        if self.enhance.max_input_pixels == 0 {
            return Err(ConfigError::Validation(
                "enhance.max_input_pixels must be non-zero".into(),
            ));
        }
        if self.enhance.max_working_pixels == 0 {
            return Err(ConfigError::Validation(
                "enhance.max_working_pixels must be non-zero".into(),
            ));
        }
        if self.blur.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "blur.max_pixels must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Engine options described by this config.
    pub fn enhance_options(&self) -> EnhanceOptions {
        EnhanceOptions {
            mode: self.enhance.mode,
            max_dimension: self.enhance.max_dimension,
            max_input_pixels: self.enhance.max_input_pixels,
            max_working_pixels: self.enhance.max_working_pixels,
            timeout: match self.enhance.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            blur_max_pixels: self.blur.max_pixels,
            mask: self.blur.mask,
        }
    }
}

/// Enhancement pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhanceConfig {
    /// `quality-aware` analyzes the input and corrects it before the preset.
    pub mode: EnhanceMode,
    /// Longest output edge in pixels.
    pub max_dimension: u32,
    /// Inputs with more pixels than this are rejected.
    pub max_input_pixels: u64,
    /// Requests whose upscaled raster exceeds this many pixels are rejected.
    pub max_working_pixels: u64,
    /// Per-image time budget in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            mode: EnhanceMode::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            max_working_pixels: DEFAULT_MAX_WORKING_PIXELS,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Background blur settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurConfig {
    /// Inputs with more pixels than this are shrunk before blurring.
    pub max_pixels: u64,
    /// Which regions stay sharp.
    pub mask: MaskStrategy,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_BLUR_MAX_PIXELS,
            mask: MaskStrategy::default(),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Quality for `.jpg` / `.jpeg` outputs.
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
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

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RetouchConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RetouchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RetouchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// A missing file yields the stock defaults. User values are merged on top
/// of the defaults, unknown keys are rejected and the result is validated.
pub fn load_config(path: &Path) -> Result<RetouchConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `retouch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Retouch Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Enhancement
# ---------------------------------------------------------------------------
[enhance]
# "quality-aware" scores brightness, contrast and sharpness first and
# denoises or equalizes before the preset runs. "standard" skips that.
mode = "quality-aware"

# Results whose longest edge exceeds this are shrunk (aspect preserved).
max_dimension = 4096

# Inputs with more pixels than this are rejected outright.
max_input_pixels = 16000000

# Requests whose upscaled raster (input pixels x scale^2) would exceed this
# are rejected before any work starts.
max_working_pixels = 64000000

# Per-image time budget in seconds. 0 disables the limit.
timeout_secs = 60

# ---------------------------------------------------------------------------
# Background blur
# ---------------------------------------------------------------------------
[blur]
# Inputs with more pixels than this are shrunk before blurring.
max_pixels = 4000000

# Which region stays sharp:
#   "radial" - a soft disc centred on the frame
#   "edges"  - detailed regions found by edge detection
mask = "radial"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1-100) for .jpg/.jpeg outputs. Other formats are lossless.
jpeg_quality = 95

# ---------------------------------------------------------------------------
# Parallel processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers for `retouch batch`.
# Omit to use all CPU cores. Larger values are clamped to the core count.
# max_processes = 4
"##
}
