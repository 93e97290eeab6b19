//! Converter configuration.
//!
//! Handles loading, validating, and merging TOML config. Values are layered:
//! stock defaults, then an optional config file, then command-line overrides.
//! Each layer only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [jpeg]
//! quality = 90              # JPEG encoding quality (1-100)
//!
//! [metadata]
//! preserve_exif = true      # Carry HEIC Exif into the JPEG
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration.
///
/// All fields have defaults; a config file need only name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// JPEG output settings.
    pub jpeg: JpegConfig,
    /// Exif handling.
    pub metadata: MetadataConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ConvertConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(ConfigError::Validation("jpeg.quality must be 1-100".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// JPEG encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Encoder quality, 1 (smallest) to 100 (best).
    pub quality: u32,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub preserve_exif: bool,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            preserve_exif: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files converted at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Command-line values that override the file config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub quality: Option<u32>,
    pub max_processes: Option<usize>,
    pub no_exif: bool,
}

impl Overrides {
    /// Sparse TOML table holding only the values that were given.
    pub fn to_toml(&self) -> Option<toml::Value> {
        let mut root = toml::map::Map::new();

        if let Some(quality) = self.quality {
            let mut jpeg = toml::map::Map::new();
            jpeg.insert("quality".into(), toml::Value::Integer(quality.into()));
            root.insert("jpeg".into(), toml::Value::Table(jpeg));
        }
        if self.no_exif {
            let mut metadata = toml::map::Map::new();
            metadata.insert("preserve_exif".into(), toml::Value::Boolean(false));
            root.insert("metadata".into(), toml::Value::Table(metadata));
        }
        if let Some(n) = self.max_processes {
            let mut processing = toml::map::Map::new();
            processing.insert(
                "max_processes".into(),
                toml::Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)),
            );
            root.insert("processing".into(), toml::Value::Table(processing));
        }

        (!root.is_empty()).then_some(toml::Value::Table(root))
    }
}

/// Stock defaults as a TOML value, the base layer of every merge.
pub fn stock_defaults_value() -> toml::Value {
    // A struct of plain scalars and tables always serializes
    toml::Value::try_from(ConvertConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
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

/// Read a config file as a raw TOML value.
///
/// Unlike a config passed on the command line being absent, a named file that
/// does not exist is an error.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge overlays onto `base` in order, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<ConvertConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: ConvertConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config: stock defaults, then `path` if given, then
/// command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<ConvertConfig, ConfigError> {
    let file = path.map(load_raw_config).transpose()?;
    resolve_config(
        stock_defaults_value(),
        file.into_iter().chain(overrides.to_toml()),
    )
}

/// A documented stock `config.toml` with all keys and their defaults.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-heic configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass this file with `simple-heic convert --config FILE`.
# Command-line flags (--quality, --jobs, --no-exif) override it.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Encoding quality for converted HEIC files (1 = smallest, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Copy the Exif block (orientation, capture time, camera, GPS) from each
# HEIC into its JPEG. Copied files always keep their bytes unchanged.
preserve_exif = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of files converted in parallel.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
