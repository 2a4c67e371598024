//! Pipeline configuration.
//!
//! Loaded once at startup from `lightbox.toml`. Stock defaults are the base
//! layer; the user file only needs the keys it wants to change. Unknown keys
//! are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! storage_root = "static"   # Originals and derivatives live under here
//!
//! [queue]
//! capacity = 100            # Bounded admission queue, per media class
//!
//! [output]
//! quality = 95              # JPEG quality (1-100)
//! staged_writes = false     # Write to *.partial then rename into place
//!
//! [[sizes.photo]]
//! width = 50
//! height = 50
//! mode = "thumbnail"        # "thumbnail" (crop to fill) or "fit" (no crop)
//! suffix = "t50"
//! # ... one entry per derivative, in processing order
//! ```
//!
//! Size tables are frozen for the life of the process; changing them means
//! restarting the pipeline.

use crate::sizes::{SizeError, SizeTables};
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
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config validation error: {0}")]
    Sizes(#[from] SizeError),
}

/// Default file name looked up by the CLI.
pub const CONFIG_FILE: &str = "lightbox.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding `photos/`, `avatars/`, and the JSON store.
    pub storage_root: PathBuf,
    pub queue: QueueConfig,
    pub output: OutputConfig,
    pub sizes: SizeTables,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("static"),
            queue: QueueConfig::default(),
            output: OutputConfig::default(),
            sizes: SizeTables::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::Validation(
                "queue.capacity must be at least 1".into(),
            ));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        self.sizes.validate()?;
        Ok(())
    }
}

/// Admission queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Items buffered per class before producers start waiting.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Derivative encoding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
    /// Write each derivative to a `.partial` sibling and rename it into place.
    pub staged_writes: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            staged_writes: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a user
///   `[[sizes.photo]]` list replaces the whole stock photo table.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `lightbox.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lightbox Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Directory holding photos/, avatars/ and media.json.
storage_root = "static"

# ---------------------------------------------------------------------------
# Admission queue
# ---------------------------------------------------------------------------
[queue]
# Items buffered per media class. When full, uploads wait for the worker
# instead of growing memory.
capacity = 100

# ---------------------------------------------------------------------------
# Derivative output
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best).
quality = 95

# Write each derivative to "<name>.partial" and rename it into place, so a
# crash never leaves a truncated derivative under its public name.
staged_writes = false

# ---------------------------------------------------------------------------
# Derivative sizes
# ---------------------------------------------------------------------------
# Processed in the order listed. mode = "thumbnail" crops to exactly
# width x height; mode = "fit" scales inside the box without cropping or
# upscaling. Suffixes are lowercase alphanumeric; "o" is reserved for
# originals. Defining a table replaces the stock one entirely.

[[sizes.photo]]
width = 50
height = 50
mode = "thumbnail"
suffix = "t50"

[[sizes.photo]]
width = 100
height = 100
mode = "thumbnail"
suffix = "t100"

[[sizes.photo]]
width = 200
height = 200
mode = "thumbnail"
suffix = "t200"

[[sizes.photo]]
width = 200
height = 200
mode = "fit"
suffix = "f200"

[[sizes.photo]]
width = 300
height = 300
mode = "fit"
suffix = "f300"

[[sizes.photo]]
width = 500
height = 500
mode = "fit"
suffix = "f500"

[[sizes.photo]]
width = 1000
height = 1000
mode = "fit"
suffix = "f1000"

[[sizes.photo]]
width = 2000
height = 2000
mode = "fit"
suffix = "f2000"

[[sizes.avatar]]
width = 25
height = 25
mode = "thumbnail"
suffix = "25"

[[sizes.avatar]]
width = 50
height = 50
mode = "thumbnail"
suffix = "50"

[[sizes.avatar]]
width = 75
height = 75
mode = "thumbnail"
suffix = "75"

[[sizes.avatar]]
width = 200
height = 200
mode = "thumbnail"
suffix = "200"
"##
}
