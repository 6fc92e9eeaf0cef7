//! Tile atlas packer.
//!
//! Packs a palette into a near-square grid image: `rows = floor(sqrt(n))`,
//! `cols = ceil(n / rows)`. Tile `i` sits at column `i % cols`, row
//! `i / cols`; leftover cells in the last row stay transparent.

use crate::types::{Palette, PixelBuffer};

/// Grid layout of a packed atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub rows: u32,
    pub cols: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Number of occupied cells.
    pub tile_count: u32,
}

impl AtlasLayout {
    /// Compute the layout for `tile_count` tiles.
    ///
    /// Depends only on the count and tile size, never on the source grid.
    pub fn for_count(tile_count: u32, tile_width: u32, tile_height: u32) -> Self {
        if tile_count == 0 {
            return Self {
                rows: 0,
                cols: 0,
                tile_width,
                tile_height,
                tile_count,
            };
        }

        let rows = integer_sqrt(tile_count);
        let cols = tile_count.div_ceil(rows);

        Self {
            rows,
            cols,
            tile_width,
            tile_height,
            tile_count,
        }
    }

    /// Atlas width in pixels.
    pub fn width(&self) -> u32 {
        self.cols * self.tile_width
    }

    /// Atlas height in pixels.
    pub fn height(&self) -> u32 {
        self.rows * self.tile_height
    }

    /// Number of cells, occupied or not.
    pub fn capacity(&self) -> u32 {
        self.rows * self.cols
    }

    /// Pixel origin of palette tile `index`.
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        (
            (index % self.cols) * self.tile_width,
            (index / self.cols) * self.tile_height,
        )
    }
}

/// Repacks palettes into atlas images.
pub struct AtlasPacker {
    pub tile_width: u32,
    pub tile_height: u32,
}

impl AtlasPacker {
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_width,
            tile_height,
        }
    }

    /// Pack every palette tile into one image.
    pub fn pack(&self, palette: &Palette) -> (PixelBuffer, AtlasLayout) {
        let layout = AtlasLayout::for_count(palette.len() as u32, self.tile_width, self.tile_height);
        let mut atlas = PixelBuffer::blank(layout.width(), layout.height());

        for (index, tile) in palette.iter() {
            let (x, y) = layout.cell_origin(index);
            atlas.blit(tile, x, y);
        }

        (atlas, layout)
    }
}

/// Largest `r` with `r * r <= n`.
fn integer_sqrt(n: u32) -> u32 {
    let mut r = (n as f64).sqrt() as u32;
    while r > 0 && r as u64 * r as u64 > n as u64 {
        r -= 1;
    }
    while (r as u64 + 1) * (r as u64 + 1) <= n as u64 {
        r += 1;
    }
    r
}
