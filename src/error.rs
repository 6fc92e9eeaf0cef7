use miette::Diagnostic;
use thiserror::Error;

use crate::types::GridError;

/// Main error type for tilex operations
#[derive(Error, Diagnostic, Debug)]
pub enum TilexError {
    #[error("IO error: {0}")]
    #[diagnostic(code(tilex::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(tilex::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Could not load image {path}: {message}")]
    #[diagnostic(code(tilex::image_load))]
    ImageLoad {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(tilex::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(tilex::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Build error: {message}")]
    #[diagnostic(code(tilex::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl From<GridError> for TilexError {
    fn from(err: GridError) -> Self {
        TilexError::Validation {
            message: err.to_string(),
            help: Some("Tile width and height must evenly divide the image size".to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TilexError>;
