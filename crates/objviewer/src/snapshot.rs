//! Single-frame rendering to an image file.

use std::path::Path;

use objviewer_core::PoseSample;
use objviewer_render::{save_image, Renderer, Scene};

use crate::error::Result;

/// Renders `scene` at `pose` and writes the frame to `path`.
///
/// The encoder follows the extension: `.png`, `.jpg` or `.jpeg`.
pub fn render_to_file<R: Renderer + ?Sized>(
    renderer: &mut R,
    scene: &Scene,
    pose: &PoseSample,
    path: &Path,
) -> Result<()> {
    let frame = renderer.render(scene, pose)?;
    save_image(path, &frame)?;
    log::info!("saved snapshot {}", path.display());
    Ok(())
}
