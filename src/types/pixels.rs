//! Rectangular RGBA pixel buffers.
//!
//! `PixelBuffer` is the currency of the whole pipeline: decoded source
//! images, extracted tiles, packed atlases and reconstructed tilesets are all
//! row-major RGBA byte grids with explicit dimensions.

use image::RgbaImage;

use crate::error::{TilexError, Result};

use super::Colour;

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A row-major RGBA pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes.
    ///
    /// Fails when `data` does not hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(TilexError::Build {
                message: format!(
                    "Pixel data for a {}x{} buffer must be {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
                help: None,
            });
        }
        Ok(Self { width, height, data })
    }

    /// Create a buffer with every pixel transparent zero.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Create a buffer filled with a single colour.
    pub fn from_pixel(width: u32, height: u32, colour: Colour) -> Self {
        let rgba = colour.to_rgba();
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self { width, height, data }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as (width, height).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if the buffer has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its raw RGBA bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Get a pixel at the given position.
    pub fn get(&self, x: u32, y: u32) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let mut rgba = [0u8; CHANNELS];
        rgba.copy_from_slice(&self.data[i..i + CHANNELS]);
        Some(Colour::from_rgba(rgba))
    }

    /// Set a pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, colour: Colour) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&colour.to_rgba());
    }

    /// Copy a rectangular region into a new buffer.
    ///
    /// The region is clipped to the buffer bounds.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> PixelBuffer {
        let width = width.min(self.width.saturating_sub(x));
        let height = height.min(self.height.saturating_sub(y));
        let row_bytes = width as usize * CHANNELS;

        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height {
            let start = self.offset(x, y + row);
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        PixelBuffer { width, height, data }
    }

    /// Copy `source` onto this buffer with its top-left corner at (x, y).
    ///
    /// Pixels are replaced, not blended; anything past the edge is clipped.
    pub fn blit(&mut self, source: &PixelBuffer, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let width = source.width.min(self.width - x);
        let height = source.height.min(self.height - y);
        let row_bytes = width as usize * CHANNELS;

        for row in 0..height {
            let src = source.offset(0, row);
            let dst = self.offset(x, y + row);
            self.data[dst..dst + row_bytes].copy_from_slice(&source.data[src..src + row_bytes]);
        }
    }

    /// Convert to an `image` crate buffer for encoding.
    pub fn to_image(&self) -> RgbaImage {
        // Length is guaranteed by construction.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
