//! Tileset reconstruction - rebuilds the source layout from palette + map.

use crate::error::{TilexError, Result};
use crate::types::{GridShape, Palette, PixelBuffer};

/// Place `palette[index_map[i]]` at the origin of every cell `i`.
///
/// With exact matching this reproduces the source image.
pub fn reconstruct(palette: &Palette, index_map: &[u32], shape: &GridShape) -> Result<PixelBuffer> {
    if index_map.len() != shape.total_cells() {
        return Err(TilexError::Build {
            message: format!(
                "Index map has {} entries but the {} grid has {} cells",
                index_map.len(),
                shape,
                shape.total_cells()
            ),
            help: None,
        });
    }

    let mut canvas = PixelBuffer::blank(shape.image_width(), shape.image_height());

    for (cell, &index) in index_map.iter().enumerate() {
        let Some(tile) = palette.get(index) else {
            return Err(TilexError::Build {
                message: format!(
                    "Cell {} references tile {} but the palette has {} tiles",
                    cell,
                    index,
                    palette.len()
                ),
                help: None,
            });
        };

        let (x, y) = shape.cell_origin(cell);
        canvas.blit(tile, x, y);
    }

    Ok(canvas)
}
