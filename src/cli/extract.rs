//! Extract command implementation.
//!
//! Loads a tilemap image, deduplicates its tiles on a background worker
//! while reporting progress, and writes the requested exports.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::config::Config;
use crate::engine::{ExtractRequest, Session, SessionEvent};
use crate::error::{TilexError, Result};
use crate::export::{write_map_json, write_tmx, ExportFormat, MapJson, TmxMap};
use crate::output::{display_path, format_millis, plural, Printer};
use crate::render::{load_image, reconstruct, write_png, AtlasPacker};
use crate::types::{GridShape, IndexMap, Palette, PixelBuffer, TileSize};
use crate::validation::{print_diagnostics, validate_request};

/// Extract a deduplicated tile palette and index map from an image
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// PNG or GIF tilemap image
    #[arg(required = true)]
    pub input: PathBuf,

    /// Tile size as WxH (e.g. 16x16)
    #[arg(long)]
    pub tile: Option<TileSize>,

    /// Matching tolerance (0 = exact); scaled by 1024 against summed channel differences
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Output directory for exports
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Export formats to write (default: all)
    #[arg(long = "format", value_enum)]
    pub formats: Vec<ExportFormat>,

    /// Pretty-print the map JSON
    #[arg(long)]
    pub pretty: bool,

    /// Path to a config file (default: ./tilex.yaml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Settings after merging flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractSettings {
    pub tile: TileSize,
    pub tolerance: f64,
    pub output: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub pretty: bool,
}

impl ExtractSettings {
    /// Flags win over config values.
    pub fn resolve(args: &ExtractArgs, config: &Config) -> Result<Self> {
        let tile = args.tile.or(config.tile).ok_or_else(|| TilexError::Parse {
            message: "No tile size given".to_string(),
            help: Some("Pass --tile WxH or set `tile:` in tilex.yaml".to_string()),
        })?;

        let formats = if args.formats.is_empty() {
            config.effective_formats()
        } else {
            args.formats.clone()
        };

        Ok(Self {
            tile,
            tolerance: args.tolerance.unwrap_or(config.tolerance),
            output: args.output.clone().unwrap_or_else(|| config.output.clone()),
            formats,
            pretty: args.pretty || config.pretty,
        })
    }
}

/// What an extraction produced.
#[derive(Debug, Clone)]
pub struct ExtractSummary {
    pub shape: GridShape,
    pub tile_count: usize,
    pub written: Vec<PathBuf>,
}

pub fn run(args: ExtractArgs, printer: &Printer) -> Result<ExtractSummary> {
    let cwd = std::env::current_dir()?;
    let config = Config::discover(args.config.as_deref(), &cwd)?;
    let settings = ExtractSettings::resolve(&args, &config)?;

    let path = &args.input;
    printer.status("Loading", &display_path(path));
    let buffer = load_image(path)?;
    printer.info("Size", &format!("{} x {}px", buffer.width(), buffer.height()));

    let mut session = Session::new();
    let buffer = preflight(Arc::new(buffer), &settings, printer)?;
    let shape = session.load(buffer, settings.tile)?;
    printer.info("Map", &format!("{} x {}", shape.num_cols, shape.num_rows));
    printer.verbose("Tolerance", &settings.tolerance.to_string());

    session.start(settings.tolerance)?;
    drive(&mut session, printer)?;

    let (Some(palette), Some(index_map)) = (session.palette(), session.index_map()) else {
        return Err(TilexError::Build {
            message: "Extraction finished without results".to_string(),
            help: None,
        });
    };

    let written = write_exports(palette, index_map, &shape, &settings, printer)?;

    Ok(ExtractSummary {
        shape,
        tile_count: palette.len(),
        written,
    })
}

/// Report every request problem up front; fail if any is an error.
fn preflight(
    buffer: Arc<PixelBuffer>,
    settings: &ExtractSettings,
    printer: &Printer,
) -> Result<Arc<PixelBuffer>> {
    let request = ExtractRequest::new(
        buffer,
        settings.tile.width,
        settings.tile.height,
        settings.tolerance,
    );
    let validation = validate_request(&request);
    if !validation.is_ok() {
        print_diagnostics(&validation, printer);
    }
    if validation.has_errors() {
        return Err(TilexError::Validation {
            message: plural(validation.error_count(), "problem", "problems") + " with the extraction request",
            help: Some("Tile width and height must evenly divide the image size".to_string()),
        });
    }

    Ok(request.image)
}

/// Pump session events until the pass completes.
fn drive(session: &mut Session, printer: &Printer) -> Result<()> {
    while let Some(event) = session.next_event() {
        match event {
            SessionEvent::Started => printer.status("Extracting", "tiles"),
            SessionEvent::Progress(fraction) => printer.progress("Progress", fraction),
            SessionEvent::Completed { tiles, elapsed } => {
                printer.finish_progress();
                printer.info("Tiles", &tiles.to_string());
                printer.info("Time", &format_millis(elapsed));
                printer.status("Finished", "extraction complete");
                return Ok(());
            }
        }
    }

    Err(TilexError::Build {
        message: "Extraction worker exited without a result".to_string(),
        help: None,
    })
}

/// Write each requested export into the output directory.
pub fn write_exports(
    palette: &Palette,
    index_map: &IndexMap,
    shape: &GridShape,
    settings: &ExtractSettings,
    printer: &Printer,
) -> Result<Vec<PathBuf>> {
    let output = &settings.output;
    if !output.exists() {
        fs::create_dir_all(output).map_err(|e| TilexError::Io {
            path: output.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
    }

    let (atlas, layout) = AtlasPacker::new(shape.tile_width, shape.tile_height).pack(palette);
    let mut written = Vec::new();

    for &format in &settings.formats {
        let path = output.join(format.file_name());
        match format {
            ExportFormat::Json => {
                write_map_json(&MapJson::new(index_map, shape), &path, settings.pretty)?;
            }
            ExportFormat::Atlas => {
                write_png(&atlas, &path)?;
                printer.verbose(
                    "Atlas",
                    &format!(
                        "{} x {} tiles ({}x{}px)",
                        layout.cols,
                        layout.rows,
                        layout.width(),
                        layout.height()
                    ),
                );
            }
            ExportFormat::Tilemap => {
                let tileset = reconstruct(palette, index_map, shape)?;
                write_png(&tileset, &path)?;
            }
            ExportFormat::Tmx => {
                let tmx = TmxMap {
                    index_map,
                    shape,
                    atlas: &layout,
                    atlas_source: ExportFormat::Atlas.file_name(),
                };
                write_tmx(&tmx, &path)?;
                if !settings.formats.contains(&ExportFormat::Atlas) {
                    printer.warning(
                        "Warning",
                        &format!(
                            "{} references {}, which was not exported",
                            display_path(&path),
                            ExportFormat::Atlas.file_name()
                        ),
                    );
                }
            }
        }
        printer.status("Wrote", &display_path(&path));
        written.push(path);
    }

    Ok(written)
}
