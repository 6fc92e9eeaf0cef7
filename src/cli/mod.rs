pub mod check;
pub mod completions;
pub mod extract;

use clap::{Parser, Subcommand};

/// tilex - Tileset extractor for tilemap images
#[derive(Parser, Debug)]
#[command(name = "tilex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print verbose status output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a deduplicated tile palette and index map from an image
    Extract(extract::ExtractArgs),

    /// Check that a tile size partitions an image, without extracting
    Check(check::CheckArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
