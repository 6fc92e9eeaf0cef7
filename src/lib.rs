//! tilex - Tileset extractor for tilemap images
//!
//! Splits an image into a grid of equal tiles, deduplicates them (exactly or
//! within a tolerance) on a background worker, and exports the resulting tile
//! palette, index map, packed atlas and reconstructed tilemap.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod output;
pub mod render;
pub mod types;
pub mod validation;

pub use config::Config;
pub use engine::{
    extract_tiles, CancelToken, ExtractEvent, ExtractRequest, ExtractResult, ExtractionHandle,
    Extractor, Session, SessionEvent,
};
pub use error::{Result, TilexError};
pub use export::{ExportFormat, MapJson, TmxMap};
pub use render::{load_image, reconstruct, write_png, AtlasLayout, AtlasPacker};
pub use types::{
    Colour, GridError, GridIssue, GridShape, IndexMap, Palette, PixelBuffer, Tile, TileSize,
    Tolerance,
};
pub use validation::{validate_request, Diagnostic, Severity, ValidationResult};
