//! Error types for objviewer-core.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the core numerics and file readers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A pose file could not be opened.
    #[error("cannot open pose file '{path}': {source}")]
    PoseFileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pose row did not have the column count of the first row.
    #[error("pose row {row} has {actual} values, expected {expected}")]
    InconsistentPoseRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A pose row contained a token that is not a number.
    #[error("pose row {row}: '{token}' is not a number")]
    InvalidPoseValue { row: usize, token: String },

    /// The pose matrix has too few columns to hold a rotation and translation.
    #[error("pose matrix has {0} columns, at least 12 are required")]
    PoseColumnCount(usize),

    /// The camera parameter file is structurally invalid.
    #[error("invalid camera parameters in '{path}': {reason}")]
    CameraParams { path: PathBuf, reason: String },

    /// Clip planes that do not satisfy `0 < near < far`.
    #[error("invalid clip planes near = {near}, far = {far}: need 0 < near < far")]
    InvalidClipPlanes { near: f64, far: f64 },

    /// Blur sigma or noise variance out of range.
    #[error("invalid degradation parameter {name} = {value}: must be finite and >= 0")]
    InvalidDegradation { name: &'static str, value: f64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for objviewer-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
