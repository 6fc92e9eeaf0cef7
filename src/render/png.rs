//! PNG input and output.
//!
//! Source images are decoded into `PixelBuffer`s; atlas and tileset images
//! are encoded back to PNG.

use std::path::Path;

use crate::error::{TilexError, Result};
use crate::types::PixelBuffer;

/// File extensions accepted as source images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "gif"];

/// Decode a PNG or GIF file into an RGBA pixel buffer.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(TilexError::ImageLoad {
            path: path.to_path_buf(),
            message: "Not a png or gif file".to_string(),
        });
    }

    if !path.exists() {
        return Err(TilexError::ImageLoad {
            path: path.to_path_buf(),
            message: "File not found".to_string(),
        });
    }

    let img = image::open(path)
        .map_err(|e| TilexError::ImageLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .to_rgba8();

    if img.width() == 0 || img.height() == 0 {
        return Err(TilexError::ImageLoad {
            path: path.to_path_buf(),
            message: format!("Image has zero dimensions ({}x{})", img.width(), img.height()),
        });
    }

    Ok(PixelBuffer::from(img))
}

/// Write a pixel buffer to a PNG file.
pub fn write_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    if buffer.is_empty() {
        return Err(TilexError::Build {
            message: format!("Cannot write an empty image to {}", path.display()),
            help: None,
        });
    }

    buffer.to_image().save(path).map_err(|e| TilexError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
    })?;

    Ok(())
}
