//! Project configuration (tilex.yaml).
//!
//! Holds defaults for `tilex extract` so repeated runs over the same
//! tilemaps don't need every flag. Command-line flags always win.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TilexError, Result};
use crate::export::ExportFormat;
use crate::types::TileSize;

/// Configuration file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "tilex.yaml";

/// Configuration loaded from tilex.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tile size as WxH.
    pub tile: Option<TileSize>,

    /// Raw matching tolerance (scaled by 1024 internally).
    pub tolerance: f64,

    /// Output directory for exports.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Export formats to write. Empty means all.
    pub formats: Vec<ExportFormat>,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile: None,
            tolerance: 0.0,
            output: default_output(),
            formats: vec![],
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TilexError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str::<Option<Self>>(content)
            .map(Option::unwrap_or_default)
            .map_err(|e| TilexError::Parse {
                message: format!("Invalid config: {}", e),
                help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
            })
    }

    /// Load an explicit config file, or `tilex.yaml` from `dir` if present,
    /// or fall back to defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Formats to export, defaulting to all.
    pub fn effective_formats(&self) -> Vec<ExportFormat> {
        if self.formats.is_empty() {
            ExportFormat::ALL.to_vec()
        } else {
            self.formats.clone()
        }
    }
}
