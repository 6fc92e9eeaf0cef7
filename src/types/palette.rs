//! Tile palettes, index maps and matching tolerance.

use std::fmt;

use crate::error::{TilexError, Result};

use super::PixelBuffer;

/// A single tile: a pixel buffer of exactly one grid cell.
pub type Tile = PixelBuffer;

/// Row-major palette indices, one per grid cell.
pub type IndexMap = Vec<u32>;

/// Raw tolerance values are multiplied by this before comparing against a
/// summed channel distance.
pub const TOLERANCE_SCALE: f64 = 1024.0;

/// The deduplicated set of tiles, in order of first discovery.
///
/// Indices are assigned on insertion and never change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    tiles: Vec<Tile>,
}

impl Palette {
    /// Create an empty palette.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tile, returning its index.
    pub fn push(&mut self, tile: Tile) -> u32 {
        self.tiles.push(tile);
        (self.tiles.len() - 1) as u32
    }

    /// Get a tile by index.
    pub fn get(&self, index: u32) -> Option<&Tile> {
        self.tiles.get(index as usize)
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Check if the palette has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over tiles with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Tile)> {
        self.tiles.iter().enumerate().map(|(i, t)| (i as u32, t))
    }

}

impl From<Vec<Tile>> for Palette {
    fn from(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }
}

/// Maximum summed channel difference under which two tiles are the same.
///
/// Holds the raw, caller-facing value; [`Tolerance::threshold`] applies
/// [`TOLERANCE_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Exact-match deduplication.
    pub const EXACT: Self = Self(0.0);

    /// Create a tolerance, rejecting negative and non-finite values.
    pub fn new(raw: f64) -> Result<Self> {
        if !raw.is_finite() || raw < 0.0 {
            return Err(TilexError::Validation {
                message: format!("Tolerance must be a non-negative number, got {}", raw),
                help: Some("Use 0 for exact matching".to_string()),
            });
        }
        Ok(Self(raw))
    }

    /// The unscaled value.
    pub fn raw(self) -> f64 {
        self.0
    }

    /// The scaled distance threshold.
    pub fn threshold(self) -> f64 {
        self.0 * TOLERANCE_SCALE
    }

    /// Whether a summed distance is within tolerance.
    pub fn accepts(self, distance: u64) -> bool {
        distance as f64 <= self.threshold()
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
