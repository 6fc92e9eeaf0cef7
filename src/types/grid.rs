//! Grid partitioning.
//!
//! A tilemap image is cut into a uniform grid of tile-sized cells. The grid
//! is only valid when the tile size divides the image exactly in both
//! directions; every mismatch is reported, not just the first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{TilexError, Result};

/// Tile dimensions in pixels, written as `WxH` (e.g. `16x16`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl TileSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for TileSize {
    type Err = TilexError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().splitn(2, ['x', 'X']).collect();
        if parts.len() != 2 {
            return Err(TilexError::Parse {
                message: format!("Invalid tile size '{}': expected WxH (e.g. 16x16)", s),
                help: Some("Use the format WxH, for example: 16x16, 8x16".to_string()),
            });
        }

        let w: u32 = parts[0].parse().map_err(|_| TilexError::Parse {
            message: format!("Invalid width '{}' in tile size '{}'", parts[0], s),
            help: Some("Width must be a positive integer".to_string()),
        })?;

        let h: u32 = parts[1].parse().map_err(|_| TilexError::Parse {
            message: format!("Invalid height '{}' in tile size '{}'", parts[1], s),
            help: Some("Height must be a positive integer".to_string()),
        })?;

        if w == 0 || h == 0 {
            return Err(TilexError::Parse {
                message: format!("Tile size must be non-zero, got {}x{}", w, h),
                help: Some("Both width and height must be at least 1".to_string()),
            });
        }

        Ok(Self::new(w, h))
    }
}

impl TryFrom<String> for TileSize {
    type Error = TilexError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TileSize> for String {
    fn from(size: TileSize) -> Self {
        size.to_string()
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One reason a tile size does not partition an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridIssue {
    #[error("image width {image_width} is not divisible by tile width {tile_width}")]
    NonIntegerColumnCount { image_width: u32, tile_width: u32 },

    #[error("image height {image_height} is not divisible by tile height {tile_height}")]
    NonIntegerRowCount { image_height: u32, tile_height: u32 },
}

impl GridIssue {
    /// Machine-readable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            GridIssue::NonIntegerColumnCount { .. } => "tilex::grid::non-integer-columns",
            GridIssue::NonIntegerRowCount { .. } => "tilex::grid::non-integer-rows",
        }
    }
}

/// Every issue found while deriving a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridError {
    pub issues: Vec<GridIssue>,
}

impl std::error::Error for GridError {}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// The shape of a valid tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub tile_width: u32,
    pub tile_height: u32,
    pub num_cols: u32,
    pub num_rows: u32,
}

impl GridShape {
    /// Derive the grid for an image and tile size.
    ///
    /// Column and row checks run independently so both are reported when
    /// both fail. A zero quotient (tile larger than the image, or an empty
    /// image) counts as non-integer.
    pub fn derive(
        image_width: u32,
        image_height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> std::result::Result<Self, GridError> {
        let mut issues = Vec::new();

        let num_cols = exact_quotient(image_width, tile_width);
        if num_cols.is_none() {
            issues.push(GridIssue::NonIntegerColumnCount {
                image_width,
                tile_width,
            });
        }

        let num_rows = exact_quotient(image_height, tile_height);
        if num_rows.is_none() {
            issues.push(GridIssue::NonIntegerRowCount {
                image_height,
                tile_height,
            });
        }

        match (num_cols, num_rows) {
            (Some(num_cols), Some(num_rows)) => Ok(Self {
                tile_width,
                tile_height,
                num_cols,
                num_rows,
            }),
            _ => Err(GridError { issues }),
        }
    }

    /// Derive the grid from a `TileSize`.
    pub fn for_tile_size(
        image_width: u32,
        image_height: u32,
        tile: TileSize,
    ) -> std::result::Result<Self, GridError> {
        Self::derive(image_width, image_height, tile.width, tile.height)
    }

    /// Number of cells in the grid.
    pub fn total_cells(&self) -> usize {
        self.num_cols as usize * self.num_rows as usize
    }

    /// Width of the partitioned image in pixels.
    pub fn image_width(&self) -> u32 {
        self.num_cols * self.tile_width
    }

    /// Height of the partitioned image in pixels.
    pub fn image_height(&self) -> u32 {
        self.num_rows * self.tile_height
    }

    /// Pixel origin of the cell at row-major `index`.
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let col = (index % self.num_cols as usize) as u32;
        let row = (index / self.num_cols as usize) as u32;
        (col * self.tile_width, row * self.tile_height)
    }

    /// Iterate over (row, col) pairs in scan order: rows outer, columns inner.
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.num_rows).flat_map(move |row| (0..self.num_cols).map(move |col| (row, col)))
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} ({}x{} tiles)",
            self.num_cols, self.num_rows, self.tile_width, self.tile_height
        )
    }
}

fn exact_quotient(total: u32, part: u32) -> Option<u32> {
    if part == 0 || total % part != 0 || total / part == 0 {
        return None;
    }
    Some(total / part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_size_valid() {
        assert_eq!("16x16".parse::<TileSize>().unwrap(), TileSize::new(16, 16));
        assert_eq!("8x16".parse::<TileSize>().unwrap(), TileSize::new(8, 16));
        assert_eq!("8X16".parse::<TileSize>().unwrap(), TileSize::new(8, 16));
    }

    #[test]
    fn test_tile_size_invalid() {
        assert!("abc".parse::<TileSize>().is_err());
        assert!("axb".parse::<TileSize>().is_err());
        assert!("0x16".parse::<TileSize>().is_err());
        assert!("16x0".parse::<TileSize>().is_err());
        assert!("-1x4".parse::<TileSize>().is_err());
    }

    #[test]
    fn test_tile_size_display() {
        assert_eq!(TileSize::new(8, 16).to_string(), "8x16");
    }

    #[test]
    fn test_derive_valid() {
        let shape = GridShape::derive(32, 16, 8, 8).unwrap();
        assert_eq!(shape.num_cols, 4);
        assert_eq!(shape.num_rows, 2);
        assert_eq!(shape.total_cells(), 8);
        assert_eq!(shape.image_width(), 32);
        assert_eq!(shape.image_height(), 16);
    }

    #[test]
    fn test_derive_single_cell() {
        let shape = GridShape::derive(8, 8, 8, 8).unwrap();
        assert_eq!(shape.total_cells(), 1);
    }

    #[test]
    fn test_derive_bad_columns() {
        let err = GridShape::derive(30, 16, 8, 8).unwrap_err();
        assert_eq!(
            err.issues,
            vec![GridIssue::NonIntegerColumnCount {
                image_width: 30,
                tile_width: 8
            }]
        );
    }

    #[test]
    fn test_derive_bad_rows() {
        let err = GridShape::derive(32, 17, 8, 8).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(matches!(err.issues[0], GridIssue::NonIntegerRowCount { .. }));
    }

    #[test]
    fn test_derive_reports_both() {
        let err = GridShape::derive(30, 17, 8, 8).unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(matches!(err.issues[0], GridIssue::NonIntegerColumnCount { .. }));
        assert!(matches!(err.issues[1], GridIssue::NonIntegerRowCount { .. }));
        assert!(err.to_string().contains("width 30"));
        assert!(err.to_string().contains("height 17"));
    }

    #[test]
    fn test_derive_zero_quotient() {
        // Tile larger than image
        let err = GridShape::derive(4, 4, 8, 8).unwrap_err();
        assert_eq!(err.issues.len(), 2);

        // Zero tile size never divides
        let err = GridShape::derive(16, 16, 0, 8).unwrap_err();
        assert_eq!(err.issues.len(), 1);

        // Empty image
        assert!(GridShape::derive(0, 0, 8, 8).is_err());
    }

    #[test]
    fn test_partition_validity_sweep() {
        for image_width in 1..=40u32 {
            for tile_width in 1..=12u32 {
                let result = GridShape::derive(image_width, 24, tile_width, 8);
                let divides = image_width % tile_width == 0;
                match result {
                    Ok(shape) => {
                        assert!(divides);
                        assert_eq!(shape.num_cols * tile_width, image_width);
                    }
                    Err(err) => {
                        assert!(!divides);
                        assert_eq!(err.issues.len(), 1);
                        assert!(matches!(
                            err.issues[0],
                            GridIssue::NonIntegerColumnCount { .. }
                        ));
                    }
                }
            }
        }
    }

    #[test]
    fn test_cell_origin() {
        let shape = GridShape::derive(32, 16, 8, 8).unwrap();
        assert_eq!(shape.cell_origin(0), (0, 0));
        assert_eq!(shape.cell_origin(3), (24, 0));
        assert_eq!(shape.cell_origin(4), (0, 8));
        assert_eq!(shape.cell_origin(7), (24, 8));
    }

    #[test]
    fn test_iter_cells_scan_order() {
        let shape = GridShape::derive(6, 4, 2, 2).unwrap();
        let cells: Vec<(u32, u32)> = shape.iter_cells().collect();
        assert_eq!(
            cells,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }

    #[test]
    fn test_issue_codes() {
        let err = GridShape::derive(3, 3, 2, 2).unwrap_err();
        let codes: Vec<&str> = err.issues.iter().map(|i| i.code()).collect();
        assert_eq!(
            codes,
            vec!["tilex::grid::non-integer-columns", "tilex::grid::non-integer-rows"]
        );
    }
}
