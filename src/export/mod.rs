//! Export formats for extraction results.
//!
//! Map JSON and TMX documents; the atlas and tileset images are written by
//! `render::write_png`.

mod map_json;
mod tmx;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TilexError;

pub use map_json::{write_map_json, MapJson};
pub use tmx::{write_tmx, TmxMap, FIRST_GID};

/// One exportable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Index map as JSON (map.json)
    Json,
    /// Packed tile atlas (tiles.png)
    Atlas,
    /// Reconstructed tileset image (tilemap.png)
    Tilemap,
    /// Tiled TMX map referencing the atlas (map.tmx)
    Tmx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Atlas,
        ExportFormat::Tilemap,
        ExportFormat::Tmx,
    ];

    /// Default output file name.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "map.json",
            ExportFormat::Atlas => "tiles.png",
            ExportFormat::Tilemap => "tilemap.png",
            ExportFormat::Tmx => "map.tmx",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Atlas => "atlas",
            ExportFormat::Tilemap => "tilemap",
            ExportFormat::Tmx => "tmx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = TilexError;

    fn from_str(s: &str) -> Result<Self, TilexError> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TilexError::Parse {
                message: format!("Unknown export format '{}'", s),
                help: Some("Valid formats: json, atlas, tilemap, tmx".to_string()),
            })
    }
}
