//! TMX map export.
//!
//! Writes a Tiled-style XML map with one tileset (the packed atlas image)
//! and one layer holding a `<tile>` element per cell. Global tile ids are
//! 1-based: `gid = palette index + 1`, with 0 reserved for "no tile".

use std::fs;
use std::path::Path;

use crate::error::{TilexError, Result};
use crate::render::AtlasLayout;
use crate::types::GridShape;

/// First global tile id of the single tileset.
pub const FIRST_GID: u32 = 1;

/// Inputs for one TMX document.
pub struct TmxMap<'a> {
    pub index_map: &'a [u32],
    pub shape: &'a GridShape,
    pub atlas: &'a AtlasLayout,
    /// Atlas image path, relative to the TMX file.
    pub atlas_source: &'a str,
}

impl TmxMap<'_> {
    /// Render the XML document.
    pub fn to_xml(&self) -> String {
        let shape = self.shape;
        let atlas = self.atlas;

        let mut output = String::new();
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str(&format!(
            "<map version=\"1.0\" orientation=\"orthogonal\" renderorder=\"right-down\" width=\"{}\" height=\"{}\" tilewidth=\"{}\" tileheight=\"{}\">\n",
            shape.num_cols, shape.num_rows, shape.tile_width, shape.tile_height
        ));
        output.push_str(&format!(
            " <tileset firstgid=\"{}\" name=\"tiles\" tilewidth=\"{}\" tileheight=\"{}\" tilecount=\"{}\" columns=\"{}\">\n",
            FIRST_GID, atlas.tile_width, atlas.tile_height, atlas.tile_count, atlas.cols
        ));
        output.push_str(&format!(
            "  <image source=\"{}\" width=\"{}\" height=\"{}\"/>\n",
            escape_attr(self.atlas_source),
            atlas.width(),
            atlas.height()
        ));
        output.push_str(" </tileset>\n");
        output.push_str(&format!(
            " <layer name=\"map\" width=\"{}\" height=\"{}\">\n",
            shape.num_cols, shape.num_rows
        ));
        output.push_str("  <data>\n");
        for &index in self.index_map {
            output.push_str(&format!("   <tile gid=\"{}\"/>\n", index + FIRST_GID));
        }
        output.push_str("  </data>\n");
        output.push_str(" </layer>\n");
        output.push_str("</map>\n");

        output
    }
}

/// Write a TMX document to `path`.
pub fn write_tmx(map: &TmxMap<'_>, path: &Path) -> Result<()> {
    fs::write(path, map.to_xml()).map_err(|e| TilexError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write TMX map: {}", e),
    })?;
    Ok(())
}

/// Escape a string for use inside a double-quoted XML attribute.
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
