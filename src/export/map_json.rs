//! Map JSON export.
//!
//! `{"map": [...], "numCols": n, "numRows": n}`: the row-major index map
//! plus the grid it belongs to.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TilexError, Result};
use crate::types::GridShape;

/// The map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapJson {
    pub map: Vec<u32>,
    #[serde(rename = "numCols")]
    pub num_cols: u32,
    #[serde(rename = "numRows")]
    pub num_rows: u32,
}

impl MapJson {
    pub fn new(index_map: &[u32], shape: &GridShape) -> Self {
        Self {
            map: index_map.to_vec(),
            num_cols: shape.num_cols,
            num_rows: shape.num_rows,
        }
    }

    /// Serialize, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| TilexError::Build {
            message: format!("Failed to serialize map: {}", e),
            help: None,
        })
    }
}

/// Write the map document to `path`.
pub fn write_map_json(map: &MapJson, path: &Path, pretty: bool) -> Result<()> {
    let json = map.to_json(pretty)?;
    fs::write(path, json).map_err(|e| TilexError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write map JSON: {}", e),
    })?;
    Ok(())
}
