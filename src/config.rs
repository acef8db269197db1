//! Persisted user settings.
//!
//! Settings are stored as TOML and searched at `./figcrop.toml`, then
//! `<config dir>/figcrop/config.toml` (the local file wins). Command-line
//! arguments override file values; `--save-config` writes the effective
//! settings back to the user config file so they stick across runs.
//!
//! Everything a batch relies on is validated up front, before any job
//! starts, so a misconfigured output directory never produces a partial
//! batch.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crop::{CropOptions, Margins};

// ============================================================
// Constants
// ============================================================

/// Project-local config file name.
const LOCAL_CONFIG_FILE: &str = "figcrop.toml";

/// Directory under the user config root.
const CONFIG_DIR: &str = "figcrop";

/// User config file name.
const CONFIG_FILE: &str = "config.toml";

/// Suffix inserted before the extension for non-overwrite output.
const OUTPUT_SUFFIX: &str = "_cropped";

// ============================================================
// Error Types
// ============================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to write config {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("output directory required when overwrite is disabled")]
    OutputDirRequired,

    #[error("output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    #[error("margins must be between 0 and {0}")]
    MarginOutOfRange(u32),

    #[error("duplicate destination: {0}")]
    DuplicateDestination(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Settings
// ============================================================

/// User settings, persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overwrite each input file in place.
    pub overwrite_original: bool,
    /// Destination directory when overwrite is disabled.
    pub output_dir: Option<PathBuf>,
    /// Extra margin kept around detected content, in page units.
    pub margins: Margins,
    /// Brightness threshold for content detection.
    pub threshold: u8,
    /// Minimum content span in pixels.
    pub min_content_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let detection = CropOptions::default();
        Self {
            overwrite_original: true,
            output_dir: None,
            margins: Margins::default(),
            threshold: detection.threshold,
            min_content_size: detection.min_content_size,
        }
    }
}

impl Settings {
    /// Load settings from the usual locations, defaulting when absent.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from_path(&local);
        }
        if let Some(user) = Self::user_config_path() {
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }
        Ok(Self::default())
    }

    /// Load settings from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Location of the user config file, when a config dir exists.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Write these settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, text).map_err(|e| write_err(e.to_string()))
    }

    /// Write these settings to the user config file.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::user_config_path().ok_or_else(|| ConfigError::Write {
            path: PathBuf::from(CONFIG_FILE),
            message: "no user config directory".to_string(),
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Apply command-line overrides on top of file values.
    pub fn merge_with_cli(mut self, cli: &CliOverrides) -> Self {
        if let Some(overwrite) = cli.overwrite {
            self.overwrite_original = overwrite;
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = Some(dir.clone());
            // an explicit destination implies writing there
            if cli.overwrite.is_none() {
                self.overwrite_original = false;
            }
        }
        if let Some(left) = cli.margin_left {
            self.margins.left = left;
        }
        if let Some(top) = cli.margin_top {
            self.margins.top = top;
        }
        if let Some(right) = cli.margin_right {
            self.margins.right = right;
        }
        if let Some(bottom) = cli.margin_bottom {
            self.margins.bottom = bottom;
        }
        if let Some(threshold) = cli.threshold {
            self.threshold = threshold;
        }
        if let Some(min_size) = cli.min_content_size {
            self.min_content_size = min_size;
        }
        self
    }

    /// Check everything a batch relies on; called before any job starts.
    pub fn validate(&self) -> Result<()> {
        if !self.margins.in_range() {
            return Err(ConfigError::MarginOutOfRange(Margins::MAX));
        }
        if !self.overwrite_original {
            match &self.output_dir {
                None => return Err(ConfigError::OutputDirRequired),
                Some(dir) if !dir.is_dir() => {
                    return Err(ConfigError::OutputDirMissing(dir.clone()))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Detection options derived from these settings.
    pub fn crop_options(&self) -> CropOptions {
        CropOptions {
            threshold: self.threshold,
            min_content_size: self.min_content_size,
        }
    }

    /// Resolve the destination for one input file.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        if self.overwrite_original {
            return input.to_path_buf();
        }
        let dir = self
            .output_dir
            .as_deref()
            .unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")));
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let name = match input.extension().and_then(OsStr::to_str) {
            Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{ext}"),
            None => format!("{stem}{OUTPUT_SUFFIX}"),
        };
        dir.join(name)
    }
}

// ============================================================
// CLI Overrides
// ============================================================

/// Values explicitly set on the command line.
///
/// Only set fields override the config file, so file values survive when
/// the user does not mention them.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub overwrite: Option<bool>,
    pub output_dir: Option<PathBuf>,
    pub margin_left: Option<u32>,
    pub margin_top: Option<u32>,
    pub margin_right: Option<u32>,
    pub margin_bottom: Option<u32>,
    pub threshold: Option<u8>,
    pub min_content_size: Option<u32>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
