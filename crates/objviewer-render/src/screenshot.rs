//! Writing rendered frames to disk.

use std::path::Path;

use image::{ImageFormat, RgbImage};

use crate::error::{RenderError, RenderResult};

/// Saves a frame, choosing the encoder from the file extension.
///
/// Supports `.png`, `.jpg` and `.jpeg` (case-insensitive).
pub fn save_image(path: &Path, frame: &RgbImage) -> RenderResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let format = match extension.as_str() {
        "png" => ImageFormat::Png,
        "jpg" | "jpeg" => ImageFormat::Jpeg,
        _ => return Err(RenderError::UnsupportedFormat(extension)),
    };
    frame.save_with_format(path, format)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
