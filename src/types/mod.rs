//! Core domain types for tilex.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - `PixelBuffer` - row-major RGBA images and tiles
//! - `GridShape` - the validated tile grid of an image
//! - `Palette` - deduplicated tiles in discovery order
//! - `Tolerance` - the tile equivalence threshold

mod colour;
mod grid;
mod palette;
mod pixels;

pub use colour::Colour;
pub use grid::{GridError, GridIssue, GridShape, TileSize};
pub use palette::{IndexMap, Palette, Tile, Tolerance, TOLERANCE_SCALE};
pub use pixels::{PixelBuffer, CHANNELS};
