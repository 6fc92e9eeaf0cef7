//! Extraction request validation.
//!
//! Every problem with a request is collected before anything runs, so the
//! caller can fix tile size, tolerance and image in one go. Used by
//! `Extractor::submit` and `tilex check`.

mod diagnostic;

pub use diagnostic::{Diagnostic, Severity, ValidationResult};

use crate::engine::ExtractRequest;
use crate::output::Printer;
use crate::types::{GridShape, CHANNELS, TOLERANCE_SCALE};

/// Run all checks against an extraction request.
pub fn validate_request(request: &ExtractRequest) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(check_image(request));
    result.merge(check_tile_size(request));
    result.merge(check_grid(request));
    result.merge(check_tolerance(request));

    result
}

fn check_image(request: &ExtractRequest) -> ValidationResult {
    let mut result = ValidationResult::new();
    if request.image.is_empty() {
        result.push(
            Diagnostic::error(
                "tilex::image::empty",
                format!(
                    "Image has zero dimensions ({}x{})",
                    request.image.width(),
                    request.image.height()
                ),
            )
            .with_help("Input image must have non-zero width and height"),
        );
    }
    result
}

fn check_tile_size(request: &ExtractRequest) -> ValidationResult {
    let mut result = ValidationResult::new();
    if request.tile_width == 0 || request.tile_height == 0 {
        result.push(
            Diagnostic::error(
                "tilex::tile::zero",
                format!(
                    "Tile size must be non-zero, got {}x{}",
                    request.tile_width, request.tile_height
                ),
            )
            .with_help("Both width and height must be at least 1"),
        );
    }
    result
}

/// Column and row issues are reported independently.
fn check_grid(request: &ExtractRequest) -> ValidationResult {
    let mut result = ValidationResult::new();
    if request.image.is_empty() {
        return result;
    }

    match GridShape::derive(
        request.image.width(),
        request.image.height(),
        request.tile_width,
        request.tile_height,
    ) {
        Ok(shape) if shape.total_cells() == 1 => {
            result.push(Diagnostic::warning(
                "tilex::grid::single-cell",
                "The tile size covers the whole image; the palette will hold a single tile",
            ));
        }
        Ok(_) => {}
        Err(err) => {
            for issue in err.issues {
                result.push(issue);
            }
        }
    }
    result
}

fn check_tolerance(request: &ExtractRequest) -> ValidationResult {
    let mut result = ValidationResult::new();
    let raw = request.tolerance;

    if !raw.is_finite() || raw < 0.0 {
        result.push(
            Diagnostic::error(
                "tilex::tolerance::invalid",
                format!("Tolerance must be a non-negative number, got {}", raw),
            )
            .with_help("Use 0 for exact matching"),
        );
        return result;
    }

    // Largest possible distance between two tiles of this size
    let max_distance =
        request.tile_width as f64 * request.tile_height as f64 * CHANNELS as f64 * 255.0;
    if max_distance > 0.0 && raw * TOLERANCE_SCALE >= max_distance {
        result.push(
            Diagnostic::warning(
                "tilex::tolerance::saturated",
                format!(
                    "Tolerance {} matches every possible {}x{} tile",
                    raw, request.tile_width, request.tile_height
                ),
            )
            .with_help("The palette will collapse to a single tile"),
        );
    }
    result
}

/// Print diagnostics through the status printer.
pub fn print_diagnostics(result: &ValidationResult, printer: &Printer) {
    for d in result.iter() {
        let label = printer.severity(&d.severity.to_string(), d.severity == Severity::Error);
        eprintln!("  {}[{}]: {}", label, d.code, d.message);
        if let Some(help) = &d.help {
            eprintln!("    {}: {}", printer.dim("help"), help);
        }
    }

    if result.has_errors() {
        printer.error("Invalid", &result.summary());
    } else if result.has_warnings() {
        printer.warning("Valid", &format!("{} warning(s)", result.warning_count()));
    }
}
