//! The render/capture boundary.

use image::RgbImage;
use objviewer_core::PoseSample;

use crate::error::RenderResult;
use crate::scene::Scene;

/// Draws one frame of a scene at a pose and hands back the pixels.
///
/// Each call is blocking and yields exactly one image the size of
/// [`Scene::frame_size`].
pub trait Renderer {
    /// Renders `scene` with the model placed at `pose`.
    fn render(&mut self, scene: &Scene, pose: &PoseSample) -> RenderResult<RgbImage>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, scene: &Scene, pose: &PoseSample) -> RenderResult<RgbImage> {
        (**self).render(scene, pose)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, scene: &Scene, pose: &PoseSample) -> RenderResult<RgbImage> {
        (**self).render(scene, pose)
    }
}
