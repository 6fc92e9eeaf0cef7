//! Check command implementation.
//!
//! Reports whether a tile size partitions an image, without extracting.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::engine::ExtractRequest;
use crate::error::{TilexError, Result};
use crate::output::{display_path, plural, Printer};
use crate::render::load_image;
use crate::types::{GridShape, PixelBuffer, TileSize};
use crate::validation::{print_diagnostics, validate_request, ValidationResult};

/// Check that a tile size partitions an image, without extracting
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// PNG or GIF tilemap image
    #[arg(required = true)]
    pub input: PathBuf,

    /// Tile size as WxH (e.g. 16x16)
    #[arg(long)]
    pub tile: TileSize,

    /// Matching tolerance to check as well
    #[arg(long, default_value_t = 0.0)]
    pub tolerance: f64,
}

pub fn run(args: CheckArgs, printer: &Printer) -> Result<GridShape> {
    printer.status("Checking", &display_path(&args.input));
    let buffer = load_image(&args.input)?;
    printer.info("Size", &format!("{} x {}px", buffer.width(), buffer.height()));

    let (validation, shape) = check(buffer, args.tile, args.tolerance);
    if !validation.is_ok() {
        print_diagnostics(&validation, printer);
    }

    match shape {
        Some(shape) if !validation.has_errors() => {
            printer.info("Map", &format!("{} x {}", shape.num_cols, shape.num_rows));
            printer.status(
                "Valid",
                &format!(
                    "{} of {}",
                    plural(shape.total_cells(), "cell", "cells"),
                    args.tile
                ),
            );
            Ok(shape)
        }
        _ => Err(TilexError::Validation {
            message: format!("{} does not split into {} tiles", display_path(&args.input), args.tile),
            help: None,
        }),
    }
}

/// Validate a request for `buffer` and derive its grid when possible.
pub fn check(
    buffer: PixelBuffer,
    tile: TileSize,
    tolerance: f64,
) -> (ValidationResult, Option<GridShape>) {
    let request = ExtractRequest::new(Arc::new(buffer), tile.width, tile.height, tolerance);
    let validation = validate_request(&request);
    let shape = GridShape::for_tile_size(request.image.width(), request.image.height(), tile).ok();
    (validation, shape)
}
