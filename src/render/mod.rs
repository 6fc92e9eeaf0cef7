//! Rendering module for tilex.
//!
//! Turns extraction results back into images: the packed tile atlas and the
//! reconstructed tileset, plus PNG decoding and encoding.

mod atlas;
mod png;
mod tileset;

pub use atlas::{AtlasLayout, AtlasPacker};
pub use png::{load_image, write_png, SUPPORTED_EXTENSIONS};
pub use tileset::reconstruct;
