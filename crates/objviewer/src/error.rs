//! Error types for the sequence generator.

use std::path::PathBuf;

use objviewer_core::CoreError;
use objviewer_render::RenderError;
use thiserror::Error;

/// Errors that stop a batch line (and, by default, the whole batch).
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Pose, calibration, configuration or directory failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Model, background, texture, render or image output failure.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The batch script itself could not be read.
    #[error("cannot read batch script '{path}': {source}")]
    BatchScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script line that is not seven tokens with numeric blur and noise.
    #[error("batch line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// Calibration resolution differs from the background image.
    #[error("camera calibration size {calibration:?} does not match background size {background:?}")]
    ResolutionMismatch {
        calibration: (u32, u32),
        background: (u32, u32),
    },
}

/// A specialized Result type for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;
