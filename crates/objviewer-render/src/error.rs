//! Rendering error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading scene content or producing frames.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The OBJ model could not be read.
    #[error("cannot load model '{path}': {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    /// The background image could not be read.
    #[error("cannot open background image '{path}': {source}")]
    BackgroundLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A material texture could not be read.
    #[error("cannot load texture '{path}': {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Frame dimensions the renderer cannot produce.
    #[error("invalid frame size {width}x{height}")]
    InvalidFrame { width: u32, height: u32 },

    /// Output format not supported by the image writer.
    #[error("unsupported image format: '{0}'")]
    UnsupportedFormat(String),

    /// Image encoding error.
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
